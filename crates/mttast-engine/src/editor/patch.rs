use super::Point;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Ids of the blocks whose content, position or existence changed.
    pub touched: Vec<String>,
    pub new_selection: Option<Point>,
    pub version: u64,
}
