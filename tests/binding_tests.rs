// Core binding tests
//
// Bind the fake core through the loader and check that an incomplete module
// is refused before any of its functions run.

mod common;

use common::{events, reset, FakeSymbols};
use termretro::abi::symbols;
use termretro::loader::{CoreApi, CoreModule, LoadError};

#[test]
fn test_complete_module_binds_without_calling_core() {
    reset();
    let api = CoreApi::bind(&FakeSymbols::complete()).unwrap();
    let module = CoreModule::from_api(api);

    assert!(module.path().is_none());
    assert!(events().is_empty());
}

#[test]
fn test_each_missing_symbol_is_named() {
    for &symbol in symbols::REQUIRED.iter() {
        reset();
        let err = match CoreApi::bind(&FakeSymbols::without(symbol)) {
            Ok(_) => panic!("binding without {} succeeded", symbol),
            Err(err) => err,
        };

        match &err {
            LoadError::MissingSymbol { symbol: missing, .. } => assert_eq!(*missing, symbol),
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.to_string().contains(symbol));
        assert!(events().is_empty(), "core was called while binding without {}", symbol);
    }
}

#[test]
fn test_open_missing_library() {
    let err = match CoreModule::open("/nonexistent/termretro/core_libretro.so") {
        Ok(_) => panic!("opened a library that does not exist"),
        Err(err) => err,
    };

    assert!(matches!(err, LoadError::Open { .. }));
    assert!(err.to_string().contains("/nonexistent/termretro/core_libretro.so"));
}
