//! Whole-tensor helpers for the derivation steps. Every step operates on
//! complete arrays at once; these wrap the handful of broadcast shapes the
//! engine needs (per-good scaling, the Good x Waste spread, guarded shares).

use ndarray::{Array3, Array4, Array5, ArrayView1, ArrayView2, Axis, Zip};

/// Sum a (t, r, g, s) flow over the Good axis into (t, r, s).
pub fn sum_goods(a: &Array4<f64>) -> Array3<f64> {
    a.sum_axis(Axis(2))
}

/// Sum a (t, r, w, s) pool over the Waste axis into (t, r, s).
pub fn sum_waste(a: &Array4<f64>) -> Array3<f64> {
    a.sum_axis(Axis(2))
}

/// Scale a (t, r, g, s) tensor by a per-good coefficient.
pub fn scale_goods(a: &Array4<f64>, per_good: ArrayView1<f64>) -> Array4<f64> {
    debug_assert_eq!(a.len_of(Axis(2)), per_good.len());
    let mut out = a.clone();
    for (g, mut lane) in out.axis_iter_mut(Axis(2)).enumerate() {
        lane *= per_good[g];
    }
    out
}

/// Scale a (t, r, w, s) tensor by a per-waste-category coefficient.
pub fn scale_waste(a: &Array4<f64>, per_waste: ArrayView1<f64>) -> Array4<f64> {
    debug_assert_eq!(a.len_of(Axis(2)), per_waste.len());
    let mut out = a.clone();
    for (w, mut lane) in out.axis_iter_mut(Axis(2)).enumerate() {
        lane *= per_waste[w];
    }
    out
}

/// Multiply a (t, r, g, s) tensor elementwise by a (t, g, s) factor that is
/// uniform across regions.
pub fn scale_by_timeline(a: &Array4<f64>, factor: &Array3<f64>) -> Array4<f64> {
    debug_assert_eq!(a.len_of(Axis(0)), factor.len_of(Axis(0)));
    debug_assert_eq!(a.len_of(Axis(2)), factor.len_of(Axis(1)));
    debug_assert_eq!(a.len_of(Axis(3)), factor.len_of(Axis(2)));
    let mut out = a.clone();
    for mut region_slice in out.axis_iter_mut(Axis(1)) {
        region_slice *= factor;
    }
    out
}

/// Outer product of a (t, r, g, s) outflow with a (g, w) distribution,
/// yielding (t, r, g, w, s).
pub fn spread_over_waste(outflow: &Array4<f64>, dist: ArrayView2<f64>) -> Array5<f64> {
    let (t, r, g, s) = outflow.dim();
    debug_assert_eq!(g, dist.nrows());
    let w = dist.ncols();
    let mut out = Array5::zeros((t, r, g, w, s));
    for (gi, mut per_good) in out.axis_iter_mut(Axis(2)).enumerate() {
        // per_good: (t, r, w, s)
        let source = outflow.index_axis(Axis(2), gi);
        for (wi, mut lane) in per_good.axis_iter_mut(Axis(2)).enumerate() {
            lane.assign(&source);
            lane *= dist[(gi, wi)];
        }
    }
    out
}

/// Pointwise minimum.
pub fn minimum(a: &Array3<f64>, b: &Array3<f64>) -> Array3<f64> {
    debug_assert_eq!(a.dim(), b.dim());
    Zip::from(a).and(b).map_collect(|x, y| x.min(*y))
}

/// Pointwise maximum against a scalar floor.
pub fn floor_at(a: &Array3<f64>, floor: f64) -> Array3<f64> {
    a.mapv(|x| x.max(floor))
}

/// Elementwise share with the degenerate-denominator guard: zero wherever
/// the denominator is zero instead of a division fault.
pub fn guarded_share(numerator: &Array3<f64>, denominator: &Array3<f64>) -> Array3<f64> {
    debug_assert_eq!(numerator.dim(), denominator.dim());
    Zip::from(numerator)
        .and(denominator)
        .map_collect(|n, d| if *d != 0.0 { n / d } else { 0.0 })
}
