mod token;

pub use token::{
    scan_template, Prefix, Reference, Segment, Template, TokenError, DEFER_BIND_OPTION,
};
