use crate::marker::Position;

const X_ORIGIN: f64 = 10.0;
const X_STEP: usize = 23;
const X_SPAN: usize = 80;
const Y_ORIGIN: f64 = 30.0;
const Y_STEP: usize = 17;
const Y_SPAN: usize = 40;

/// Spreads history entries across the panorama by recency index.
///
/// Index 0 is the most recent visit. The steps are coprime with their spans
/// so consecutive entries land apart, but the sequence still revisits nearby
/// spots once enough entries pile up; that is what clustering is for.
pub fn position_for_index(index: usize) -> Position {
    let x = X_ORIGIN + ((index * X_STEP) % X_SPAN) as f64;
    let y = Y_ORIGIN + ((index * Y_STEP) % Y_SPAN) as f64;
    Position::new(x, y)
}
