#[path = "helpers/mod.rs"]
mod helpers;

#[path = "hir/mod.rs"]
mod hir;

#[path = "vocab/mod.rs"]
mod vocab;

#[cfg(feature = "interchange")]
#[path = "interchange/mod.rs"]
mod interchange;
