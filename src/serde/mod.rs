//! `serde::Serialize` for trees and views, so any view can be rendered
//! through a serde data format such as `serde_json`.

mod ser;
