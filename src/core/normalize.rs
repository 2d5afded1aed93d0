use ndarray::Array2;

/// Scale reflectance counts to `[.., 1]`: divide by `scale_factor`, clamp values above 1.
///
/// Values below zero are kept as they are, matching the L2A offset convention
/// where negative reflectance is meaningful.
pub fn normalize_reflectance(data: &mut Array2<f32>, scale_factor: f32) {
    data.mapv_inplace(|v| (v / scale_factor).min(1.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn divides_and_clamps() {
        let mut data = array![[0.0_f32, 2500.0], [10000.0, 15000.0]];
        normalize_reflectance(&mut data, 10000.0);
        assert_relative_eq!(data[[0, 0]], 0.0);
        assert_relative_eq!(data[[0, 1]], 0.25);
        assert_relative_eq!(data[[1, 0]], 1.0);
        assert_relative_eq!(data[[1, 1]], 1.0);
    }

    #[test]
    fn negative_values_pass_through() {
        let mut data = array![[-1000.0_f32]];
        normalize_reflectance(&mut data, 10000.0);
        assert_relative_eq!(data[[0, 0]], -0.1);
    }
}
