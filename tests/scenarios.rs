//! Concrete end-to-end scenarios with known answers.

use itemindex::{
    ForCreator, ForIndex, IdSet, IndexCreator, IndexError, IndexType, ItemIndex, PforCreator,
    RleDeCreator, RleDeIndex,
};

const A: [u32; 6] = [1, 2, 3, 100, 101, 102];
const B: [u32; 4] = [2, 4, 100, 103];

#[test]
fn scenario_pairwise_algebra() {
    let codecs = [
        IndexType::RleDe,
        IndexType::For,
        IndexType::PFor,
        IndexType::Vector,
    ];
    for ta in codecs {
        for tb in codecs {
            let a = ItemIndex::build(&A, ta).unwrap();
            let b = ItemIndex::build(&B, tb).unwrap();
            assert_eq!(a.unite(&b).to_vec(), [1, 2, 3, 4, 100, 101, 102, 103]);
            assert_eq!(a.intersect(&b).to_vec(), [2, 100]);
            assert_eq!(a.difference(&b).to_vec(), [1, 3, 101, 102]);
            assert_eq!(a.symmetric_difference(&b).to_vec(), [1, 3, 4, 101, 102, 103]);
        }
    }
}

#[test]
fn scenario_constant_delta_collapses_to_one_run() {
    let mut creator = RleDeCreator::new();
    for id in 1..=5 {
        creator.push(id);
    }
    let index = creator.finish();
    // count 5, payload of 2 bytes: run token (5 << 1 | 1) then delta token (1 << 1)
    assert_eq!(index.data().as_ref(), &[5, 2, 11, 2]);

    let long: Vec<u32> = (1..=100_000).collect();
    let long = RleDeIndex::create(&long).unwrap();
    // only the varints of the counts grow
    assert_eq!(long.byte_size(), 3 + 1 + 3 + 1);
}

#[test]
fn scenario_one_block_plus_one() {
    let mut creator = ForCreator::new();
    for id in 1..=129 {
        creator.push(id);
    }
    let index: ForIndex = creator.finish();
    assert_eq!(index.block_count(), 2);
    assert_eq!(index.block_size_offset(), 7);
    assert_eq!(index.block_widths().len(), 2);
    assert_eq!(index.at(128), Ok(129));

    let mut creator = PforCreator::new();
    for id in 1..=129 {
        creator.push(id * 3);
    }
    let index = creator.finish();
    assert_eq!(index.block_count(), 2);
    assert_eq!(index.to_vec().last(), Some(&387));
}

#[test]
fn scenario_pfor_outlier_block() {
    let mut ids: Vec<u32> = (1..=127).collect();
    ids.push(4_000_000_000);
    let pfor = ItemIndex::build(&ids, IndexType::PFor).unwrap();
    let forr = ItemIndex::build(&ids, IndexType::For).unwrap();
    assert_eq!(pfor.to_vec(), ids);
    assert!(pfor.byte_size() < forr.byte_size());
}

#[test]
fn scenario_empty_and_single() {
    for t in [IndexType::RleDe, IndexType::For, IndexType::PFor] {
        let empty = ItemIndex::build(&[], t).unwrap();
        assert_eq!(empty.size(), 0);
        assert_eq!(empty.iter().next(), None);

        let single = ItemIndex::build(&[42], t).unwrap();
        let (tag, bytes) = single.data().unwrap();
        assert_eq!(ItemIndex::from_bytes(bytes, tag).unwrap().to_vec(), [42]);
    }
}

#[test]
fn scenario_accessor_asymmetry() {
    let rle = ItemIndex::build(&A, IndexType::RleDe).unwrap();
    assert_eq!(rle.at(6), Ok(0));

    let pfor = ItemIndex::build(&A, IndexType::PFor).unwrap();
    assert_eq!(pfor.at(6), Err(IndexError::OutOfRange { pos: 6, size: 6 }));
}

#[test]
fn scenario_filtered_top_results() {
    let docs: Vec<u32> = (0..10_000).collect();
    let tagged: Vec<u32> = (0..10_000).filter(|d| d % 3 == 0).collect();
    let deleted: Vec<u32> = (0..10_000).filter(|d| d % 9 == 0).collect();
    let intersect = [
        ItemIndex::build(&docs, IndexType::RleDe).unwrap(),
        ItemIndex::build(&tagged, IndexType::RleDe).unwrap(),
    ];
    let subtract = [ItemIndex::build(&deleted, IndexType::RleDe).unwrap()];
    let odd = |id: u32| id % 2 == 1;

    let top = ItemIndex::fused_intersect_difference(&intersect, &subtract, 5, Some(&odd));
    assert_eq!(top.to_vec(), [3, 15, 21, 33, 39]);
    assert_eq!(top.index_type(), IndexType::Vector);
}
