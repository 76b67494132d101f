use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

// Index tables follow the MediaPipe face-mesh topology. A table that doesn't match the model's
// output ordering produces nonsense geometry rather than an error.

/// Face oval, clockwise from the top of the forehead.
pub const FACE_OVAL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

/// Outer then inner lip line.
pub const LIPS: [usize; 40] = [
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 185, 40, 39, 37, 0, 267, 269, 270, 409, 78,
    95, 88, 178, 87, 14, 317, 402, 318, 324, 308, 191, 80, 81, 82, 13, 312, 311, 310, 415,
];

pub const FACE_OVAL_EDGES: [(usize, usize); 36] = [
    (10, 338),
    (338, 297),
    (297, 332),
    (332, 284),
    (284, 251),
    (251, 389),
    (389, 356),
    (356, 454),
    (454, 323),
    (323, 361),
    (361, 288),
    (288, 397),
    (397, 365),
    (365, 379),
    (379, 378),
    (378, 400),
    (400, 377),
    (377, 152),
    (152, 148),
    (148, 176),
    (176, 149),
    (149, 150),
    (150, 136),
    (136, 172),
    (172, 58),
    (58, 132),
    (132, 93),
    (93, 234),
    (234, 127),
    (127, 162),
    (162, 21),
    (21, 54),
    (54, 103),
    (103, 67),
    (67, 109),
    (109, 10),
];

pub const LEFT_EYE_EDGES: [(usize, usize); 16] = [
    (263, 249),
    (249, 390),
    (390, 373),
    (373, 374),
    (374, 380),
    (380, 381),
    (381, 382),
    (382, 362),
    (263, 466),
    (466, 388),
    (388, 387),
    (387, 386),
    (386, 385),
    (385, 384),
    (384, 398),
    (398, 362),
];

pub const RIGHT_EYE_EDGES: [(usize, usize); 16] = [
    (33, 7),
    (7, 163),
    (163, 144),
    (144, 145),
    (145, 153),
    (153, 154),
    (154, 155),
    (155, 133),
    (33, 246),
    (246, 161),
    (161, 160),
    (160, 159),
    (159, 158),
    (158, 157),
    (157, 173),
    (173, 133),
];

pub const LEFT_EYEBROW_EDGES: [(usize, usize); 8] = [
    (276, 283),
    (283, 282),
    (282, 295),
    (295, 285),
    (300, 293),
    (293, 334),
    (334, 296),
    (296, 336),
];

pub const RIGHT_EYEBROW_EDGES: [(usize, usize); 8] = [
    (46, 53),
    (53, 52),
    (52, 65),
    (65, 55),
    (70, 63),
    (63, 105),
    (105, 66),
    (66, 107),
];

pub const NOSE_EDGES: [(usize, usize); 25] = [
    (168, 6),
    (6, 197),
    (197, 195),
    (195, 5),
    (5, 4),
    (4, 1),
    (1, 19),
    (19, 94),
    (94, 2),
    (98, 97),
    (97, 2),
    (2, 326),
    (326, 327),
    (327, 294),
    (294, 278),
    (278, 344),
    (344, 440),
    (440, 275),
    (275, 4),
    (4, 45),
    (45, 220),
    (220, 115),
    (115, 48),
    (48, 64),
    (64, 98),
];

// Eyes come back as the full closed loop, not stopped at the first branch.
pub static LEFT_EYE: LazyLock<Vec<usize>> = LazyLock::new(|| contour_from_edges(&LEFT_EYE_EDGES));
pub static RIGHT_EYE: LazyLock<Vec<usize>> =
    LazyLock::new(|| contour_from_edges(&RIGHT_EYE_EDGES));
pub static LEFT_EYEBROW: LazyLock<Vec<usize>> =
    LazyLock::new(|| contour_from_edges(&LEFT_EYEBROW_EDGES));
pub static RIGHT_EYEBROW: LazyLock<Vec<usize>> =
    LazyLock::new(|| contour_from_edges(&RIGHT_EYEBROW_EDGES));
pub static NOSE: LazyLock<Vec<usize>> = LazyLock::new(|| contour_from_edges(&NOSE_EDGES));

/// Named single keypoints.
pub const KEY_POINTS: [(&str, usize); 14] = [
    ("noseTip", 1),
    ("noseBridge", 6),
    ("lipLeft", 61),
    ("lipRight", 291),
    ("lipTop", 13),
    ("lipBottom", 14),
    ("leftEyeInner", 133),
    ("leftEyeOuter", 263),
    ("rightEyeInner", 362),
    ("rightEyeOuter", 33),
    ("chin", 152),
    ("leftCheek", 234),
    ("rightCheek", 454),
    ("forehead", 10),
];

/// Walk a connection list into an ordered run of indices.
///
/// Starts at the first edge's first index and repeatedly steps to the first unvisited neighbour
/// (edges are followed in both directions), stopping once every neighbour has been seen. A closed
/// loop comes back as each index once; branches beyond the walked path are dropped.
pub fn contour_from_edges(edges: &[(usize, usize)]) -> Vec<usize> {
    let Some(&(start, _)) = edges.first() else {
        return Vec::new();
    };

    let mut adj: HashMap<usize, Vec<usize>> = HashMap::new();
    for &(a, b) in edges {
        adj.entry(a).or_default().push(b);
        adj.entry(b).or_default().push(a);
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut cur = start;
    loop {
        seen.insert(cur);
        out.push(cur);

        let next = adj
            .get(&cur)
            .and_then(|ns| ns.iter().copied().find(|n| !seen.contains(n)));
        match next {
            Some(n) => cur = n,
            None => break,
        }
    }

    out
}
