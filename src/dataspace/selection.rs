//! Dataspace selections and their wire encodings.

use super::{Dataspace, DimVec};
use crate::util::{Error, Result};

/// One dimension of a regular hyperslab as the object model describes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegularBlock {
    pub start: u64,
    pub stride: u64,
    pub count: u64,
    pub block: u64,
}

impl RegularBlock {
    pub const fn new(start: u64, stride: u64, count: u64, block: u64) -> Self {
        Self { start, stride, count, block }
    }

    /// Convert to the store's `start:stop:step` form.
    ///
    /// `stop = start + stride*(count-1) + block` (exclusive) and
    /// `step = stride/block`. A single block ignores its stride.
    pub fn to_dim(self) -> Result<HyperslabDim> {
        if self.count == 0 || self.block == 0 {
            return Err(Error::invalid("hyperslab count and block must be non-zero"));
        }
        let stride = if self.count == 1 { self.block } else { self.stride };
        if stride < self.block {
            return Err(Error::invalid(format!(
                "hyperslab blocks overlap: stride {stride} < block {}",
                self.block
            )));
        }
        let stop = stride
            .checked_mul(self.count - 1)
            .and_then(|span| span.checked_add(self.start))
            .and_then(|end| end.checked_add(self.block))
            .ok_or_else(|| Error::invalid("hyperslab extends past the addressable range"))?;
        Ok(HyperslabDim {
            start: self.start,
            stop,
            step: stride / self.block,
        })
    }
}

/// One dimension of a hyperslab in the store's form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HyperslabDim {
    pub start: u64,
    /// Exclusive
    pub stop: u64,
    pub step: u64,
}

/// Elements selected within a dataspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    None,
    Points(Vec<DimVec<u64>>),
    Hyperslab(DimVec<HyperslabDim>),
}

impl Selection {
    /// Point selection; every coordinate must have the same rank.
    pub fn points<I, P>(coords: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<DimVec<u64>>,
    {
        let coords: Vec<DimVec<u64>> = coords.into_iter().map(Into::into).collect();
        if let Some(first) = coords.first() {
            let rank = first.len();
            if rank == 0 || coords.iter().any(|c| c.len() != rank) {
                return Err(Error::invalid("point coordinates must share a non-zero rank"));
            }
        }
        Ok(Selection::Points(coords))
    }

    /// Hyperslab derived from per-dimension `(start, stride, count, block)`.
    pub fn regular_hyperslab(blocks: &[RegularBlock]) -> Result<Self> {
        if blocks.is_empty() {
            return Err(Error::invalid("hyperslab must have rank >= 1"));
        }
        blocks
            .iter()
            .map(|b| b.to_dim())
            .collect::<Result<DimVec<HyperslabDim>>>()
            .map(Selection::Hyperslab)
    }

    /// Rank implied by the selection, `None` for all/none or an empty point list.
    pub fn rank(&self) -> Option<usize> {
        match self {
            Selection::All | Selection::None => None,
            Selection::Points(coords) => coords.first().map(|c| c.len()),
            Selection::Hyperslab(dims) => Some(dims.len()),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Selection::All => "all",
            Selection::None => "none",
            Selection::Points(_) => "point",
            Selection::Hyperslab(_) => "hyperslab",
        }
    }
}

/// Encode a selection on `space`.
///
/// With `as_url_param` the result is the value of a `select=` query
/// parameter (`[start:stop:step,...]`), and only hyperslabs are allowed.
/// Otherwise it is a JSON body fragment: `"points": [...]` or
/// `"start": [...], "stop": [...], "step": [...]`. All and none selections
/// encode as an empty string.
pub fn encode_selection(space: &Dataspace, selection: &Selection, as_url_param: bool) -> Result<String> {
    if matches!(selection, Selection::All | Selection::None) {
        return Ok(String::new());
    }

    let rank = space.rank();
    if rank == 0 {
        return Err(Error::invalid(format!(
            "{} selection on a {} dataspace",
            selection.kind_name(),
            space.class_name()
        )));
    }
    if let Some(sel_rank) = selection.rank() {
        if sel_rank != rank {
            return Err(Error::invalid(format!(
                "selection rank {sel_rank} does not match dataspace rank {rank}"
            )));
        }
    }

    match (selection, as_url_param) {
        (Selection::Points(_), true) => Err(Error::UnsupportedAsUrlParam("point")),
        (Selection::Hyperslab(dims), true) => {
            let triplets: Vec<String> = dims
                .iter()
                .map(|d| format!("{}:{}:{}", d.start, d.stop, d.step))
                .collect();
            Ok(format!("[{}]", triplets.join(",")))
        }
        (Selection::Points(coords), false) => {
            // rank-1 points are written flat
            let points: Vec<String> = coords
                .iter()
                .map(|c| {
                    let items = join(c.iter().copied());
                    if rank > 1 {
                        format!("[{items}]")
                    } else {
                        items
                    }
                })
                .collect();
            Ok(format!(r#""points": [{}]"#, points.join(",")))
        }
        (Selection::Hyperslab(dims), false) => Ok(format!(
            r#""start": [{}], "stop": [{}], "step": [{}]"#,
            join(dims.iter().map(|d| d.start)),
            join(dims.iter().map(|d| d.stop)),
            join(dims.iter().map(|d| d.step)),
        )),
        (Selection::All | Selection::None, _) => Ok(String::new()),
    }
}

fn join(values: impl Iterator<Item = u64>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_block_algebra() {
        let d = RegularBlock::new(2, 3, 4, 2).to_dim().unwrap();
        // blocks at 2..4, 5..7, 8..10, 11..13
        assert_eq!((d.stop, d.step), (13, 1));

        let d = RegularBlock::new(0, 4, 3, 1).to_dim().unwrap();
        assert_eq!((d.start, d.stop, d.step), (0, 9, 4));

        // a single block ignores its stride
        let d = RegularBlock::new(5, 1, 1, 3).to_dim().unwrap();
        assert_eq!((d.stop, d.step), (8, 1));
    }

    #[test]
    fn test_regular_block_rejects() {
        assert!(RegularBlock::new(0, 1, 0, 1).to_dim().is_err());
        assert!(RegularBlock::new(0, 1, 2, 2).to_dim().is_err());
        assert!(RegularBlock::new(u64::MAX, 1, 2, 1).to_dim().is_err());
    }

    #[test]
    fn test_url_param() {
        let space = Dataspace::simple(vec![100u64, 100]).unwrap();
        let sel = Selection::regular_hyperslab(&[RegularBlock::new(0, 1, 10, 1), RegularBlock::new(2, 3, 4, 2)])
            .unwrap();
        assert_eq!(encode_selection(&space, &sel, true).unwrap(), "[0:10:1,2:13:1]");

        let pts = Selection::points([vec![1u64, 2], vec![3, 4]]).unwrap();
        assert!(matches!(
            encode_selection(&space, &pts, true),
            Err(Error::UnsupportedAsUrlParam(_))
        ));
        assert_eq!(encode_selection(&space, &Selection::All, true).unwrap(), "");
    }

    #[test]
    fn test_json_body() {
        let space = Dataspace::simple(vec![100u64, 100]).unwrap();
        let pts = Selection::points([vec![1u64, 2], vec![3, 4]]).unwrap();
        assert_eq!(encode_selection(&space, &pts, false).unwrap(), r#""points": [[1,2],[3,4]]"#);

        let line = Dataspace::simple(vec![10u64]).unwrap();
        let pts = Selection::points([vec![1u64], vec![7]]).unwrap();
        assert_eq!(encode_selection(&line, &pts, false).unwrap(), r#""points": [1,7]"#);

        let sel = Selection::regular_hyperslab(&[RegularBlock::new(1, 2, 3, 1), RegularBlock::new(0, 1, 5, 1)])
            .unwrap();
        assert_eq!(
            encode_selection(&space, &sel, false).unwrap(),
            r#""start": [1,0], "stop": [6,5], "step": [2,1]"#
        );
    }

    #[test]
    fn test_rank_checks() {
        let sel = Selection::regular_hyperslab(&[RegularBlock::new(0, 1, 1, 1)]).unwrap();
        assert!(encode_selection(&Dataspace::Scalar, &sel, true).is_err());
        let plane = Dataspace::simple(vec![4u64, 4]).unwrap();
        assert!(encode_selection(&plane, &sel, false).is_err());
        assert!(Selection::points([vec![1u64], vec![1, 2]]).is_err());
        assert!(Selection::regular_hyperslab(&[]).is_err());
    }
}
