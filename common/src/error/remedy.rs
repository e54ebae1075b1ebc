/// Actionable advice printed next to a fatal error.
///
/// Every fatal path in the binary prints one line: what failed, then the
/// remedy returned here.
pub trait Remedy {
    fn remedy(&self) -> &'static str;
}
