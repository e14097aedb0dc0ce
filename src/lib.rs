#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use fieldlens_access as access;
pub use fieldlens_utils as utils;
