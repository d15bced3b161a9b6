//! Offline k-means color calibration.
//!
//! Derives a [`super::Palette`] from a sample of colors pulled off a photographed page instead
//! of using the fixed defaults, the same way a scanner calibrates against a color checker
//! before trusting its own optics.

use rand::prelude::IndexedRandom;
use rand::rng;

use super::Color;

fn dist(a: &[f64; 3], b: &[f64; 3]) -> f64 {
	a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest_center(point: &[f64; 3], centers: &[[f64; 3]]) -> usize {
	centers
		.iter()
		.enumerate()
		.map(|(i, c)| (i, dist(point, c)))
		.min_by(|a, b| a.1.total_cmp(&b.1))
		.expect("centers is never empty")
		.0
}

/// Lloyd's-algorithm k-means clustering over RGB points, used to calibrate a palette from a
/// sample of colors read off a real photograph.
pub struct KMeans {
	points: Vec<[f64; 3]>,
	centers: Vec<[f64; 3]>,
	labels: Vec<usize>,
}

impl KMeans {
	/// Seeds `k` clusters from a random sample of `points` and assigns initial labels.
	pub fn new(points: Vec<[f64; 3]>, k: usize) -> Self {
		assert!(!points.is_empty(), "kmeans requires at least one point");
		assert!(k > 0 && k <= points.len(), "cluster count must be in 1..=points.len()");

		let mut rng = rng();
		let centers: Vec<[f64; 3]> = points.choose_multiple(&mut rng, k).copied().collect();
		let labels = points.iter().map(|p| nearest_center(p, &centers)).collect();

		Self {
			points,
			centers,
			labels,
		}
	}

	/// Recomputes each center as the mean of its currently assigned points, then relabels.
	///
	/// A center with no assigned points keeps its prior value rather than becoming `NaN`.
	pub fn update(&mut self) {
		let k = self.centers.len();
		let mut sums = vec![[0.0f64; 3]; k];
		let mut counts = vec![0usize; k];

		for (point, &label) in self.points.iter().zip(&self.labels) {
			for axis in 0..3 {
				sums[label][axis] += point[axis];
			}
			counts[label] += 1;
		}

		for (i, center) in self.centers.iter_mut().enumerate() {
			if counts[i] > 0 {
				for axis in 0..3 {
					center[axis] = sums[i][axis] / counts[i] as f64;
				}
			}
		}

		self.labels = self.points.iter().map(|p| nearest_center(p, &self.centers)).collect();
	}

	/// Runs `update` to convergence (centers stop moving) or `max_iterations`, whichever
	/// comes first.
	pub fn run(&mut self, max_iterations: usize) {
		for _ in 0..max_iterations {
			let before = self.centers.clone();
			self.update();
			if before == self.centers {
				break;
			}
		}
	}

	/// The current cluster centers, as RGB colors.
	pub fn centers(&self) -> Vec<Color> {
		self.centers
			.iter()
			.map(|c| Color::new(c[0].round() as u8, c[1].round() as u8, c[2].round() as u8))
			.collect()
	}
}

/// Clusters a sample of colors into `k` groups and returns their mean colors.
///
/// Convenience wrapper over [`KMeans`] for the common case of calibrating a four-color
/// palette from sampled cell colors.
pub fn cluster(samples: &[Color], k: usize, max_iterations: usize) -> Vec<Color> {
	let points = samples.iter().map(|c| [c.r as f64, c.g as f64, c.b as f64]).collect();
	let mut km = KMeans::new(points, k);
	km.run(max_iterations);
	km.centers()
}
