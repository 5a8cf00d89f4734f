/// Settings shared by the front end and the relation solvers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Params {
    /// Line number given to the first statement of a program. Later
    /// statements are numbered consecutively in source order.
    pub first_line: u32,
    /// Check that every member of a container body links back to that
    /// container while the solvers walk it.
    pub check_parent_links: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            first_line: 1,
            check_parent_links: true,
        }
    }
}
