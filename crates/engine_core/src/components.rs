//! Common ECS components shared with the rendering collaborator.

/// Model reference plus visibility toggle. The renderer loads `asset` by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visual {
    pub asset: &'static str,
    pub visible: bool,
}

impl Visual {
    pub fn new(asset: &'static str) -> Self {
        Self {
            asset,
            visible: true,
        }
    }

    pub fn hidden(asset: &'static str) -> Self {
        Self {
            asset,
            visible: false,
        }
    }
}

/// Human-readable label, handy in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Name(pub &'static str);
