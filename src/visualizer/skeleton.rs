// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// Number of keypoints in the COCO-Pose schema.
pub const NUM_KEYPOINTS: usize = 17;

/// COCO-Pose joint names, indexed by keypoint position.
pub const KEYPOINT_NAMES: [&str; NUM_KEYPOINTS] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
];

/// Pairs of keypoint indices drawn as limbs.
pub const SKELETON: [(usize, usize); 18] = [
    // arms
    (5, 6),
    (5, 7),
    (7, 9),
    (6, 8),
    (8, 10),
    // torso
    (5, 11),
    (6, 12),
    (11, 12),
    // legs
    (11, 13),
    (13, 15),
    (12, 14),
    (14, 16),
    // head
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    // neck to shoulders
    (0, 5),
    (0, 6),
];

/// Joint name for a keypoint index, if the index is in the schema.
#[must_use]
pub fn keypoint_name(index: usize) -> Option<&'static str> {
    KEYPOINT_NAMES.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_indices_in_range() {
        assert!(SKELETON.iter().all(|&(a, b)| a < NUM_KEYPOINTS && b < NUM_KEYPOINTS));
    }

    #[test]
    fn test_keypoint_name() {
        assert_eq!(keypoint_name(0), Some("nose"));
        assert_eq!(keypoint_name(16), Some("right_ankle"));
        assert_eq!(keypoint_name(17), None);
    }
}
