pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population standard deviation, `sqrt(sum((x - mean)^2) / n)`.
    /// Zero for fewer than two values.
    pub fn population_std_dev(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let mean = Self::mean(values);
        let sum_sq: f64 = values.iter().map(|&v| (v - mean) * (v - mean)).sum();
        (sum_sq / values.len() as f64).sqrt()
    }

    /// Sample standard deviation with the n-1 divisor. Zero for fewer than
    /// two values.
    pub fn sample_std_dev(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let mean = Self::mean(values);
        let sum_sq: f64 = values.iter().map(|&v| (v - mean) * (v - mean)).sum();
        (sum_sq / (values.len() - 1) as f64).sqrt()
    }
}
