//! Widget registration metadata.
//!
//! Purely descriptive records the host framework uses to wire model and
//! view classes together; nothing in this crate branches on them.

/// The module name widgets register under.
pub const MODULE_NAME: &str = "imspect";

/// The module version widgets register under.
pub const MODULE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Registration record for one widget: how the host addresses its model
/// and view classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetMeta {
    /// Host-side model class name
    pub model_name: &'static str,
    /// Host-side view class name
    pub view_name: &'static str,
    /// Module the widget ships in
    pub module: &'static str,
    /// Module version
    pub version: &'static str,
}

/// Registration record for the box overlay widget.
pub const BOX_OVERLAY_META: WidgetMeta = WidgetMeta {
    model_name: "BoxOverlayModel",
    view_name: "BoxOverlayView",
    module: MODULE_NAME,
    version: MODULE_VERSION,
};

/// Registration record for the crop view widget.
pub const CROP_VIEW_META: WidgetMeta = WidgetMeta {
    model_name: "CropViewModel",
    view_name: "CropView",
    module: MODULE_NAME,
    version: MODULE_VERSION,
};

/// Registration record for the detail table widget.
pub const DETAIL_TABLE_META: WidgetMeta = WidgetMeta {
    model_name: "DetailTableModel",
    view_name: "DetailTableView",
    module: MODULE_NAME,
    version: MODULE_VERSION,
};
