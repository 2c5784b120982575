/**
 * file: lib.rs
 * desc: Code shared by the community builder and its tooling.
 */
pub mod taxonomy;
pub mod util;
