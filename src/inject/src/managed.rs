//! The type-erasure boundary every bound value crosses.

use crate::util::any::AsAny;

/// Any value the injector can hand out. Blanket-implemented for every
/// `Send + Sync + 'static` type so user code never implements this by hand.
pub trait Managed: AsAny + Send + Sync + 'static {}

impl<T> Managed for T where T: AsAny + Send + Sync + 'static {}
