use crate::display::{DISPLAY_LEN, DisplayVector};

pub const ANOMALY_THRESHOLD: f64 = 5.0;

/// True when any digit sits more than [`ANOMALY_THRESHOLD`] away from the mean.
pub fn is_anomalous(display: &DisplayVector) -> bool {
    let digits = display.digits();
    let mean = digits.iter().map(|&d| f64::from(d)).sum::<f64>() / DISPLAY_LEN as f64;

    digits
        .iter()
        .any(|&d| (f64::from(d) - mean).abs() > ANOMALY_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(digits: [u8; DISPLAY_LEN]) -> DisplayVector {
        DisplayVector::new(digits).unwrap()
    }

    #[test]
    fn test_constant_is_normal() {
        assert!(!is_anomalous(&display([5; DISPLAY_LEN])));
        assert!(!is_anomalous(&display([0; DISPLAY_LEN])));
        assert!(!is_anomalous(&display([9; DISPLAY_LEN])));
    }

    #[test]
    fn test_single_spike() {
        // mean 0.75, the 9 deviates by 8.25
        assert!(is_anomalous(&display([9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])));
        assert!(is_anomalous(&display([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 9])));
    }

    #[test]
    fn test_half_split_is_normal() {
        // mean 4.5, every deviation is exactly 4.5
        assert!(!is_anomalous(&display([0, 9, 0, 9, 0, 9, 0, 9, 0, 9, 0, 9])));
    }

    #[test]
    fn test_deviation_must_exceed_threshold() {
        // mean 4.0, the 9 deviates by exactly 5.0
        assert!(!is_anomalous(&display([9, 4, 4, 4, 4, 4, 4, 3, 3, 3, 3, 3])));

        // mean 0.5, the 6 deviates by 5.5 while the zeros stay at 0.5
        assert!(is_anomalous(&display([6, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])));
        // mean 5/12, the 5 deviates by ~4.58
        assert!(!is_anomalous(&display([5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])));
    }

    #[test]
    fn test_deterministic() {
        let spike = display([1, 2, 9, 0, 0, 0, 0, 0, 1, 0, 0, 0]);

        let first = is_anomalous(&spike);
        for _ in 0..10 {
            assert_eq!(is_anomalous(&spike), first);
        }
    }
}
