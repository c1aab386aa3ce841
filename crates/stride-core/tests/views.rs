//! Integration tests for the aliasing contract of tensor views.

use stride_core::{DType, StrideError, Tensor, TensorView};

fn grid() -> Tensor {
    let data: Vec<f32> = (0..12).map(|i| i as f32).collect();
    Tensor::from_vec(data, &[3, 4]).unwrap()
}

#[test]
fn test_view_matches_owner() {
    let t = grid();
    for i in 0..3 {
        let v = t.view(&[i]).unwrap();
        for j in 0..4 {
            assert_eq!(v.at(&[j]).unwrap(), t.at(&[i, j]).unwrap());
        }
    }
}

#[test]
fn test_mutation_through_view_is_visible() {
    let t = grid();
    let v = t.view(&[2]).unwrap();
    v.set_at(&[3], 99.5f64).unwrap();
    assert_eq!(t.at(&[2, 3]).unwrap(), 99.5f32);
    assert_eq!(t.get::<f32>(&[2, 3]).unwrap(), 99.5);
}

#[test]
fn test_many_views_share_storage() {
    let t = grid();
    let views: Vec<TensorView> = (0..3).map(|i| t.view(&[i]).unwrap()).collect();
    for (i, v) in views.iter().enumerate() {
        v.set_at(&[0], -(i as f32)).unwrap();
    }
    let col: Vec<f32> = (0..3).map(|i| t.get::<f32>(&[i, 0]).unwrap()).collect();
    assert_eq!(col, vec![0.0, -1.0, -2.0]);

    let clone = views[1].clone();
    clone.set_at(&[1], 0.25f32).unwrap();
    assert_eq!(views[1].at(&[1]).unwrap(), 0.25f32);
}

#[test]
fn test_view_of_empty_prefix() {
    let t = grid();
    let whole = t.view(&[]).unwrap();
    assert_eq!(whole.remaining_dims(), &t.shape());
    assert_eq!(whole.at(&[1, 1]).unwrap(), 5.0f32);
}

#[test]
fn test_views_invalidated_by_layout_change() {
    let mut t = grid();
    let before = t.view(&[0]).unwrap();
    t.reshape(&[2, 6]).unwrap();
    assert!(matches!(before.at(&[0]), Err(StrideError::StaleView { .. })));

    let after = t.view(&[1]).unwrap();
    assert_eq!(after.remaining_dims().dims(), &[6]);
    assert_eq!(after.at(&[0]).unwrap(), 6.0f32);

    t.permute(&[1, 0]).unwrap();
    assert!(matches!(after.at(&[0]), Err(StrideError::StaleView { .. })));
    assert_eq!(
        before.at(&[0]).unwrap_err().kind(),
        stride_core::ErrorKind::StaleView
    );
}

#[test]
fn test_views_survive_element_writes() {
    let mut t = grid();
    let v = t.view(&[1]).unwrap();
    t.set_at(&[1, 0], 42.0f32).unwrap();
    t.transform(|x| x).unwrap();
    t.to(stride_core::Device::Cuda(0));
    assert_eq!(v.at(&[0]).unwrap(), 42.0f32);
}

#[test]
fn test_view_outlives_owner() {
    let v = {
        let t = Tensor::zeros(&[2, 2], DType::I8).unwrap();
        t.view(&[0]).unwrap()
    };
    assert_eq!(v.at(&[0]), Err(StrideError::DetachedView));
    assert_eq!(v.set_at(&[0], 1), Err(StrideError::DetachedView));
    assert!(matches!(v.to_tensor(), Err(StrideError::DetachedView)));
}

#[test]
fn test_clone_does_not_alias() {
    let t = grid();
    let copy = t.clone();
    let v = copy.view(&[0]).unwrap();
    v.set_at(&[0], 100.0f32).unwrap();
    assert_eq!(t.at(&[0, 0]).unwrap(), 0.0f32);
    assert_eq!(copy.at(&[0, 0]).unwrap(), 100.0f32);
}
