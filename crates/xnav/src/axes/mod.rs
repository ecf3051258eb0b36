//! Primitive axis cursors.
//!
//! [`AxisCursor`] walks one tree using only the [`crate::tree::Tree`]
//! primitives; trees may substitute their own cursor through
//! [`crate::tree::Tree::cursor`]. [`RoutedAxisIterator`] lifts either kind into
//! the handle space so a single cursor works across every registered document.

mod routed;
mod walker;

pub use routed::RoutedAxisIterator;
pub use walker::AxisCursor;
