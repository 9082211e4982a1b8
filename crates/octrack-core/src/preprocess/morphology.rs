use ndarray::Array2;

/// Binary dilation with a `size` x `size` rectangular structuring element
/// anchored at its center.
///
/// A pixel becomes true if ANY pixel of the element placed on it is true.
/// Out-of-bounds pixels are ignored. Sizes 0 and 1 leave the mask unchanged.
pub fn dilate_rect(mask: &Array2<bool>, size: usize) -> Array2<bool> {
    if size <= 1 || !mask.iter().any(|&v| v) {
        return mask.clone();
    }
    let rows = dilate_rows(mask, size);
    dilate_cols(&rows, size)
}

/// Horizontal pass: the rectangle is separable into a row and a column run.
fn dilate_rows(mask: &Array2<bool>, size: usize) -> Array2<bool> {
    let (h, w) = mask.dim();
    let anchor = (size / 2) as isize;
    let mut result = Array2::from_elem((h, w), false);

    for row in 0..h {
        for col in 0..w {
            let start = (col as isize - anchor).max(0) as usize;
            let end = ((col as isize - anchor + size as isize) as usize).min(w);
            result[[row, col]] = (start..end).any(|c| mask[[row, c]]);
        }
    }

    result
}

fn dilate_cols(mask: &Array2<bool>, size: usize) -> Array2<bool> {
    let (h, w) = mask.dim();
    let anchor = (size / 2) as isize;
    let mut result = Array2::from_elem((h, w), false);

    for row in 0..h {
        let start = (row as isize - anchor).max(0) as usize;
        let end = ((row as isize - anchor + size as isize) as usize).min(h);
        for col in 0..w {
            result[[row, col]] = (start..end).any(|r| mask[[r, col]]);
        }
    }

    result
}
