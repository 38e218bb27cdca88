use crate::object::ObjectId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SpatialError {
    #[error("world half extent must be finite and positive (half_extent: {half_extent})")]
    InvalidWorldExtent { half_extent: f32 },
    #[error("cell size must be finite and positive (cell_size: {cell_size})")]
    InvalidCellSize { cell_size: f32 },
    #[error("circle radius must be finite and non-negative (radius: {radius})")]
    InvalidCircleRadius { radius: f32 },
    #[error("position must be finite (x: {x}, y: {y})")]
    InvalidPosition { x: f32, y: f32 },
    #[error("beam object {id} has no source/destination segment")]
    MissingBeamSegment { id: ObjectId },
    #[error("object {id} is already tracked")]
    DuplicateObject { id: ObjectId },
}

pub type SpatialResult<T> = Result<T, SpatialError>;

/// The full width (`2 * half_extent`) has to be finite as well, or every
/// split line of the root would be NaN.
pub(crate) fn validate_world(half_extent: f32, cell_size: f32) -> SpatialResult<()> {
    if !(half_extent > 0.0 && (half_extent * 2.0).is_finite()) {
        return Err(SpatialError::InvalidWorldExtent { half_extent });
    }
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(SpatialError::InvalidCellSize { cell_size });
    }
    Ok(())
}

pub(crate) fn validate_position(x: f32, y: f32) -> SpatialResult<()> {
    if !(x.is_finite() && y.is_finite()) {
        return Err(SpatialError::InvalidPosition { x, y });
    }
    Ok(())
}

/// Query radii may be `+inf` (unbounded search) but never NaN or negative.
pub(crate) fn validate_query_radius(radius: f32) -> SpatialResult<()> {
    if radius.is_nan() || radius < 0.0 {
        return Err(SpatialError::InvalidCircleRadius { radius });
    }
    Ok(())
}
