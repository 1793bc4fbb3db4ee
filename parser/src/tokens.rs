pub const STRING_QUOTE: char = '\'';
pub const BACKTICK: char = '`';
pub const DOUBLE_QUOTE: char = '"';
pub const STRING_ESCAPE_PREFIX: char = '\\';

pub const PLACEHOLDER: char = '?';
pub const STATEMENT_TERMINATOR: char = ';';

pub const LINE_COMMENT: &str = "--";
pub const BLOCK_COMMENT_OPEN: &str = "/*";
pub const BLOCK_COMMENT_CLOSE: &str = "*/";

pub const FORMAT_KEYWORD: &str = "FORMAT";
