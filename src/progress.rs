use serde::Serialize;

/// Completed/total counts for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        flags.into_iter().fold(Self::default(), |acc, done| Self {
            completed: acc.completed + usize::from(done),
            total: acc.total + 1,
        })
    }

    /// Unrounded percentage, used for the bar width. An empty set is 0%.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    /// Whole percent shown inside the bar, always rounded down.
    pub fn floor_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.completed * 100 / self.total) as u32
    }

    pub fn label(&self) -> String {
        format!("{}%", self.floor_percent())
    }

    pub fn width(&self) -> String {
        format!("{}%", self.percentage())
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

impl std::ops::Add for Progress {
    type Output = Progress;

    fn add(self, other: Progress) -> Progress {
        Progress::new(self.completed + other.completed, self.total + other.total)
    }
}

impl std::iter::Sum for Progress {
    fn sum<I: Iterator<Item = Progress>>(iter: I) -> Self {
        iter.fold(Progress::default(), |acc, p| acc + p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_instead_of_rounding() {
        let p = Progress::new(2, 3);
        assert_eq!(p.floor_percent(), 66);
        assert_eq!(p.label(), "66%");
        assert!(p.percentage() > 66.6);
    }

    #[test]
    fn empty_is_zero_percent() {
        let p = Progress::default();
        assert_eq!(p.label(), "0%");
        assert_eq!(p.width(), "0%");
    }

    #[test]
    fn complete_only_when_counts_match() {
        assert!(Progress::new(4, 4).is_complete());
        assert!(!Progress::new(3, 4).is_complete());
        assert_eq!(Progress::new(4, 4).label(), "100%");
    }

    #[test]
    fn from_flags_counts_checked() {
        let p = Progress::from_flags([true, false, true, false]);
        assert_eq!(p, Progress::new(2, 4));
        assert_eq!(p.width(), "50%");
    }
}
