pub mod boolean;
pub mod stitch;

pub use boolean::{BooleanOp, SetOperator2D, SetOperator3D, SheetSetOperator};
pub use stitch::{Stitcher2D, Stitcher3D};
