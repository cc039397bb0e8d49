//! Thread-local view builder pooling for worker threads.
//!
//! Each thread lazily creates one [`ViewBuilder`] (parser plus compiled
//! queries) and reuses it for every record it processes. A builder is rebuilt
//! only when a caller asks for different [`ViewOptions`].

use crate::ts::TreeSitterError;
use crate::views::{ViewBuilder, ViewOptions};
use std::cell::RefCell;

thread_local! {
    static VIEW_BUILDER: RefCell<Option<ViewBuilder>> = const { RefCell::new(None) };
}

/// Execute function with this thread's pooled builder.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use func_views::pool::with_view_builder;
/// use func_views::ViewOptions;
///
/// let views = with_view_builder(ViewOptions::default(), |builder| {
///     builder.build("def f():\n    return 1\n")
/// })??;
/// assert_eq!(views.name, "f");
/// # Ok(())
/// # }
/// ```
pub fn with_view_builder<F, R>(options: ViewOptions, f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut ViewBuilder) -> R,
{
    VIEW_BUILDER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let builder = match slot.take() {
            Some(builder) if builder.options() == options => builder,
            _ => ViewBuilder::new(options)?,
        };
        let builder = slot.insert(builder);
        Ok(f(builder))
    })
}
