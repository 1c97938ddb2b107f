use std::error::Error;
use std::f64::consts::PI;

pub type DynError = Box<dyn Error + Send + Sync>;

pub fn hanning_window(len: usize) -> Vec<f64> {
    let mut window = vec![0.0; len];
    for i in 0..len {
        window[i] = 0.5 * (1.0 - (2.0 * PI * i as f64 / (len as f64 - 1.0)).cos());
    }
    window
}

#[cfg(test)]
mod tests {
    use super::hanning_window;

    #[test]
    fn hanning_tapers_to_zero_at_edges() {
        let window = hanning_window(256);
        assert!(window[0].abs() < 1e-12);
        assert!(window[255].abs() < 1e-9);
        assert!(window[128] > 0.99);
    }
}
