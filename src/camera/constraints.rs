use crate::providers::{ConstraintValue, FacingMode, VideoConstraints};

pub const HD_WIDTH: u32 = 1920;
pub const HD_HEIGHT: u32 = 1080;

/// Constraint sets tried in order, most preferred first. The last entry
/// accepts any camera.
pub fn fallback_chain() -> Vec<VideoConstraints> {
    vec![
        VideoConstraints::facing(ConstraintValue::Ideal(FacingMode::Environment)),
        VideoConstraints::facing(ConstraintValue::Exact(FacingMode::Environment)),
        VideoConstraints::facing(ConstraintValue::Ideal(FacingMode::Environment)).with_resolution(
            ConstraintValue::Ideal(HD_WIDTH),
            ConstraintValue::Ideal(HD_HEIGHT),
        ),
        VideoConstraints::any(),
    ]
}
