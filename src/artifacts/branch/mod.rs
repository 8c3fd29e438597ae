pub mod branch_name;

pub const INVALID_BRANCH_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// Branch created by `init` and checked out by default
pub const DEFAULT_BRANCH: &str = "main";

/// Directory (relative to the store root) holding branch refs
pub const HEADS_PREFIX: &str = "refs/heads/";
