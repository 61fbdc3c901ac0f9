use kurbo::BezPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOp {
    Union,
    /// `first` minus `second`.
    Difference,
    Intersect,
    Xor,
}

/// Boolean path operations supplied by the rendering backend.
pub trait PathOps {
    fn combine(&self, op: PathOp, first: &BezPath, second: &BezPath) -> BezPath;

    /// False for backends that cannot compute real boolean results.
    fn is_exact(&self) -> bool {
        true
    }
}

/// Fallback backend: concatenates operands, which matches `Union` under
/// non-zero filling of same-orientation contours and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcatPathOps;

impl PathOps for ConcatPathOps {
    fn combine(&self, _op: PathOp, first: &BezPath, second: &BezPath) -> BezPath {
        let mut out = first.clone();
        for el in second.elements() {
            out.push(*el);
        }
        out
    }

    fn is_exact(&self) -> bool {
        false
    }
}
