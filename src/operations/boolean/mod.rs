mod classify;
mod select;
mod set_2d;
mod set_3d;
mod sheet;

pub use classify::{classify_facets, Classified, Classify, FacetClass};
pub use select::{should_keep_facet, BooleanOp, FacetSource};
pub use set_2d::SetOperator2D;
pub use set_3d::SetOperator3D;
pub use sheet::SheetSetOperator;
