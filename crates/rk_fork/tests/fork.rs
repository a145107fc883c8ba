mod common;

use std::{collections::HashSet, sync::Arc};

use common::entry;
use pretty_assertions::assert_eq;
use rk_fork::{
    error::{Error, Result},
    Object, ParserRegistry, ResourceFork, ResourceParser, TypeCode,
};
use tracing_test::traced_test;

const A: TypeCode = TypeCode::new(*b"AAAA");
const B: TypeCode = TypeCode::new(*b"BBBB");
const C: TypeCode = TypeCode::new(*b"CCCC");
const T: TypeCode = TypeCode::new(*b"TTTT");

/// Decodes a resource as the sum of its bytes
struct Checksum;

impl ResourceParser for Checksum {
    fn type_codes(&self) -> Vec<TypeCode> {
        vec![T]
    }

    fn decode(&self, data: Vec<u8>) -> Result<Object> {
        Ok(Arc::new(data.iter().map(|&b| b as u32).sum::<u32>()))
    }
}

#[traced_test]
#[test]
fn later_file_overrides_earlier() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let d1 = common::write(
        &dir,
        "Nova Data 1.ndat",
        &common::ndat(&vec![(*b"TTTT", vec![entry(100, None, b"first")])], 0),
    );
    let d2 = common::write(
        &dir,
        "Plug-in.rez",
        &common::rez(&vec![(*b"TTTT", vec![entry(100, None, b"second")])]),
    );

    let fork = ResourceFork::empty();
    fork.add_file(&d1)?;
    let second = fork.add_file(&d2)?;

    assert_eq!(fork.file_paths(), vec![d1.clone(), d2.clone()]);
    assert_eq!(fork.data(T, 100)?, Some(b"second".to_vec()));

    assert!(fork.remove(&second));
    assert_eq!(fork.file_paths(), vec![d1]);
    assert_eq!(fork.data(T, 100)?, Some(b"first".to_vec()));

    Ok(())
}

#[traced_test]
#[test]
fn types_and_resources_are_unioned() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let d1 = common::write(
        &dir,
        "One.ndat",
        &common::ndat(
            &vec![
                (*b"AAAA", vec![entry(128, Some("a"), b"1")]),
                (*b"BBBB", vec![entry(128, Some("b1"), b"2")]),
            ],
            0,
        ),
    );
    let d2 = common::write(
        &dir,
        "Two.ndat",
        &common::ndat(
            &vec![
                (*b"BBBB", vec![entry(129, Some("b2"), b"3")]),
                (*b"CCCC", vec![entry(128, Some("c"), b"4")]),
            ],
            0,
        ),
    );

    let fork = ResourceFork::empty();
    let results = fork.add_files(&[&d1, &d2]);
    assert!(results.iter().all(Result::is_ok));

    let types: HashSet<TypeCode> = fork.all_types().into_iter().collect();
    assert_eq!(types, HashSet::from([A, B, C]));
    assert_eq!(fork.all_types().len(), 3);

    let b: Vec<(i16, Option<String>)> = fork
        .resources_of_type(B)
        .iter()
        .map(|r| (r.id(), r.name().map(|n| n.into_owned())))
        .collect();
    assert_eq!(b, vec![(129, Some("b2".into())), (128, Some("b1".into()))]);

    assert!(fork.resources_of_type(TypeCode::new(*b"NONE")).is_empty());
    assert_eq!(fork.data(A, 128)?, Some(b"1".to_vec()));
    assert_eq!(fork.data(C, 128)?, Some(b"4".to_vec()));
    assert_eq!(fork.data(C, 999)?, None);

    Ok(())
}

#[test]
fn removing_a_middle_file_keeps_the_others_in_order() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths: Vec<_> = (0..3u8)
        .map(|i| {
            common::write(
                &dir,
                &format!("{i}.rez"),
                &common::rez(&vec![(*b"TTTT", vec![entry(1, None, &[i])])]),
            )
        })
        .collect();

    let fork = ResourceFork::empty();
    let directories: Vec<_> = fork
        .add_files(&paths)
        .into_iter()
        .collect::<Result<_>>()?;

    assert_eq!(fork.data(T, 1)?, Some(vec![2]));
    assert!(fork.remove(&directories[1]));
    assert_eq!(fork.file_paths(), vec![paths[0].clone(), paths[2].clone()]);
    assert_eq!(fork.data(T, 1)?, Some(vec![2]));

    assert!(fork.remove(&directories[2]));
    assert_eq!(fork.data(T, 1)?, Some(vec![0]));

    Ok(())
}

#[traced_test]
#[test]
fn failed_file_is_never_added() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let good = common::write(
        &dir,
        "Good.ndat",
        &common::ndat(&vec![(*b"TTTT", vec![entry(1, None, b"ok")])], 0),
    );
    let packed = common::write(
        &dir,
        "Packed.ndat",
        &common::ndat(&vec![(*b"TTTT", vec![entry(1, None, b"no")])], 0x0040),
    );

    let fork = ResourceFork::empty();
    assert!(matches!(fork.add_file(&packed), Err(Error::Unsupported(_))));
    assert!(fork.is_empty());

    let results = fork.add_files(&[&packed, &good]);
    assert!(results[0].is_err());
    assert!(results[1].is_ok());
    assert_eq!(fork.len(), 1);
    assert_eq!(fork.data(T, 1)?, Some(b"ok".to_vec()));

    Ok(())
}

#[test]
fn decoded_objects_are_cached_until_flushed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = common::write(
        &dir,
        "Data.ndat",
        &common::ndat(
            &vec![
                (*b"TTTT", vec![entry(5, None, &[1, 2, 3])]),
                (*b"AAAA", vec![entry(5, None, &[9])]),
            ],
            0,
        ),
    );

    let registry = ParserRegistry::with_parsers([Arc::new(Checksum) as Arc<dyn ResourceParser>]);
    let fork = ResourceFork::new(Arc::new(registry));
    fork.add_file(&path)?;

    let first = fork.object(T, 5)?.expect("resource exists");
    let second = fork.object(T, 5)?.expect("resource exists");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.downcast_ref::<u32>(), Some(&6));

    let resource = fork.resource(T, 5).expect("resource exists");
    resource.flush_cache();
    let third = fork.object(T, 5)?.expect("resource exists");
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.downcast_ref::<u32>(), Some(&6));

    // no parser registered for AAAA, so the object is the raw data
    let raw = fork.object(A, 5)?.expect("resource exists");
    assert_eq!(raw.downcast_ref::<Vec<u8>>(), Some(&vec![9]));
    assert_eq!(
        resource.object_as::<u32>(fork.registry())?.as_deref(),
        Some(&6)
    );

    assert!(fork.object(T, 6)?.is_none());

    Ok(())
}

#[test]
fn handles_outlive_removal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = common::write(
        &dir,
        "Data.rez",
        &common::rez(&vec![(*b"TTTT", vec![entry(7, Some("kept"), b"still here")])]),
    );

    let fork = ResourceFork::empty();
    let directory = fork.add_file(&path)?;
    let resource = fork.resource(T, 7).expect("resource exists");

    assert!(fork.remove(&directory));
    drop(directory);

    assert!(fork.resource(T, 7).is_none());
    assert_eq!(resource.data()?, b"still here".to_vec());
    assert_eq!(resource.name().as_deref(), Some("kept"));

    Ok(())
}
