//! Per-second console report formatting.

/// Summary line printed once per completed window.
pub fn summary_line(samples: usize, average: f64, dips: u32, net_steps: i32) -> String {
    format!("#Smpl/s = {samples:4} avg = {average:5.3}V dips = {dips:3} enc {net_steps:+3}")
}

/// Sparse preview of up to ten samples spread evenly across the window,
/// each shown as `index:value`.
pub fn preview_line(samples: &[f64]) -> String {
    if samples.is_empty() {
        return " (no samples)".to_string();
    }
    let show = samples.len().min(10);
    let mut out = String::new();
    for i in 0..show {
        let idx = if show == 1 {
            0
        } else {
            let pos = i as f64 * (samples.len() - 1) as f64 / (show - 1) as f64;
            (pos.round() as usize).min(samples.len() - 1)
        };
        out.push(' ');
        out.push_str(&format!("{idx:3}:{:.3}", samples[idx]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_has_fixed_field_layout() {
        let line = summary_line(987, 1.6, 4, -2);
        assert_eq!(line, "#Smpl/s =  987 avg = 1.600V dips =   4 enc  -2");
    }

    #[test]
    fn empty_window_previews_a_placeholder() {
        assert_eq!(preview_line(&[]), " (no samples)");
    }

    #[test]
    fn short_window_previews_every_sample() {
        let line = preview_line(&[1.0, 2.0]);
        assert_eq!(line, "   0:1.000   1:2.000");
    }

    #[test]
    fn long_window_previews_ten_spread_samples() {
        let samples: Vec<f64> = (0..100).map(f64::from).collect();
        let line = preview_line(&samples);
        assert_eq!(line.matches(':').count(), 10);
        assert!(line.starts_with("   0:0.000"));
        assert!(line.ends_with(" 99:99.000"));
    }
}
