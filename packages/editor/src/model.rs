//! # Document Model Types
//!
//! Pages hold vertically stacked sections. Blank sections own freely
//! positioned elements; widget sections render self-contained content and
//! never own elements.
//!
//! Element properties are typed per element family. Each family keeps an
//! `extra` map for style keys the core does not interpret, so documents
//! written by newer hosts survive a load/save round trip.

use crate::animation::{AnimationConfig, PageTransition};
use crate::geometry::{Breakpoints, Rect, ViewportMode};
use crate::ids::{ElementId, PageId, SectionId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub type PropertyMap = Map<String, Value>;

/// Deserialize an optional value, treating anything malformed as absent
pub(crate) fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// Deserialize a value where `null` means the type's default
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

/// Kinds of freely positioned elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementType {
    Heading,
    Subheading,
    Text,
    Caption,
    Quote,
    Button,
    Image,
    Frame,
    Grid,
    Divider,
    Spacer,
    ContactForm,
    CustomForm,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Heading => "heading",
            ElementType::Subheading => "subheading",
            ElementType::Text => "text",
            ElementType::Caption => "caption",
            ElementType::Quote => "quote",
            ElementType::Button => "button",
            ElementType::Image => "image",
            ElementType::Frame => "frame",
            ElementType::Grid => "grid",
            ElementType::Divider => "divider",
            ElementType::Spacer => "spacer",
            ElementType::ContactForm => "contactForm",
            ElementType::CustomForm => "customForm",
        }
    }

    /// Width and height at the desktop reference width
    pub fn base_size(&self) -> (f64, f64) {
        match self {
            ElementType::Heading => (400.0, 60.0),
            ElementType::Subheading => (350.0, 40.0),
            ElementType::Text => (300.0, 100.0),
            ElementType::Caption => (250.0, 30.0),
            ElementType::Quote => (400.0, 120.0),
            ElementType::Button => (160.0, 48.0),
            ElementType::Image => (300.0, 200.0),
            ElementType::Frame => (200.0, 200.0),
            ElementType::Grid => (400.0, 300.0),
            ElementType::Divider => (400.0, 20.0),
            ElementType::Spacer => (100.0, 40.0),
            ElementType::ContactForm => (400.0, 420.0),
            ElementType::CustomForm => (400.0, 300.0),
        }
    }

    /// Text-family elements auto-grow to fit their content
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ElementType::Heading
                | ElementType::Subheading
                | ElementType::Text
                | ElementType::Caption
                | ElementType::Quote
        )
    }

    /// Elements whose font follows their width on resize
    pub fn scales_font(&self) -> bool {
        matches!(
            self,
            ElementType::Heading | ElementType::Text | ElementType::Button
        )
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    pub content: String,
    pub font_size: f64,
    pub font_weight: u32,
    pub font_family: String,
    pub color: String,
    pub text_align: String,
    pub line_height: f64,
    pub letter_spacing: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient")]
    pub animation: Option<AnimationConfig>,
    #[serde(flatten)]
    pub extra: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonProps {
    pub content: String,
    pub font_size: f64,
    pub font_weight: u32,
    pub font_family: String,
    pub background_color: String,
    pub color: String,
    pub border_radius: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient")]
    pub animation: Option<AnimationConfig>,
    #[serde(flatten)]
    pub extra: PropertyMap,
}

/// Image source: an inline data URI preview or a hosted URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    pub src: String,
    pub alt: String,
    pub object_fit: String,
    pub border_radius: f64,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient")]
    pub animation: Option<AnimationConfig>,
    #[serde(flatten)]
    pub extra: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameProps {
    pub frame_type: String,
    pub image_src: String,
    pub image_alt: String,
    pub object_fit: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient")]
    pub animation: Option<AnimationConfig>,
    #[serde(flatten)]
    pub extra: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProps {
    pub grid_type: String,
    pub gap: f64,
    pub cells: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient")]
    pub animation: Option<AnimationConfig>,
    #[serde(flatten)]
    pub extra: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividerProps {
    pub color: String,
    pub thickness: f64,
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient")]
    pub animation: Option<AnimationConfig>,
    #[serde(flatten)]
    pub extra: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacerProps {
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient")]
    pub animation: Option<AnimationConfig>,
    #[serde(flatten)]
    pub extra: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormProps {
    pub form_title: String,
    pub fields: Vec<FormField>,
    pub submit_button_text: String,
    pub success_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient")]
    pub animation: Option<AnimationConfig>,
    #[serde(flatten)]
    pub extra: PropertyMap,
}

/// Typed element properties, one variant per element family
#[derive(Debug, Clone, PartialEq)]
pub enum ElementProps {
    Text(TextProps),
    Button(ButtonProps),
    Image(ImageProps),
    Frame(FrameProps),
    Grid(GridProps),
    Divider(DividerProps),
    Spacer(SpacerProps),
    Form(FormProps),
}

fn text_defaults(content: &str, font_size: f64, font_weight: u32, color: &str, line_height: f64) -> TextProps {
    TextProps {
        content: content.to_string(),
        font_size,
        font_weight,
        font_family: "Inter".to_string(),
        color: color.to_string(),
        text_align: "left".to_string(),
        line_height,
        letter_spacing: 0.0,
        font_style: None,
        animation: None,
        extra: PropertyMap::new(),
    }
}

fn form_defaults(title: &str, fields: Vec<FormField>, submit: &str, success: &str) -> FormProps {
    FormProps {
        form_title: title.to_string(),
        fields,
        submit_button_text: submit.to_string(),
        success_message: success.to_string(),
        animation: None,
        extra: PropertyMap::new(),
    }
}

fn field(id: &str, field_type: &str, label: &str, placeholder: &str) -> FormField {
    FormField {
        id: id.to_string(),
        field_type: field_type.to_string(),
        label: label.to_string(),
        placeholder: placeholder.to_string(),
        required: true,
    }
}

impl ElementProps {
    /// Properties a freshly created element of `ty` starts with
    pub fn defaults(ty: ElementType) -> Self {
        match ty {
            ElementType::Heading => Self::Text(text_defaults("New Heading", 48.0, 700, "#1A1A1A", 1.2)),
            ElementType::Subheading => Self::Text(text_defaults("Subheading", 24.0, 600, "#374151", 1.3)),
            ElementType::Text => Self::Text(text_defaults("Click to edit text", 16.0, 400, "#6B7280", 1.5)),
            ElementType::Caption => {
                let mut props = text_defaults("Caption text", 12.0, 400, "#9CA3AF", 1.4);
                props.letter_spacing = 0.5;
                Self::Text(props)
            }
            ElementType::Quote => {
                let mut props = text_defaults(
                    "\"Your inspirational quote goes here\"",
                    20.0,
                    400,
                    "#4B5563",
                    1.6,
                );
                props.font_family = "Playfair Display".to_string();
                props.text_align = "center".to_string();
                props.font_style = Some("italic".to_string());
                Self::Text(props)
            }
            ElementType::Button => Self::Button(ButtonProps {
                content: "Click Me".to_string(),
                font_size: 16.0,
                font_weight: 600,
                font_family: "Inter".to_string(),
                background_color: "#3B82F6".to_string(),
                color: "#ffffff".to_string(),
                border_radius: 8.0,
                padding_x: 24.0,
                padding_y: 12.0,
                animation: None,
                extra: PropertyMap::new(),
            }),
            ElementType::Image => Self::Image(ImageProps {
                src: String::new(),
                alt: "Image".to_string(),
                object_fit: "cover".to_string(),
                border_radius: 0.0,
                opacity: 100.0,
                animation: None,
                extra: PropertyMap::new(),
            }),
            ElementType::Frame => Self::Frame(FrameProps {
                frame_type: "circle".to_string(),
                image_src: String::new(),
                image_alt: "Frame image".to_string(),
                object_fit: "cover".to_string(),
                animation: None,
                extra: PropertyMap::new(),
            }),
            ElementType::Grid => Self::Grid(GridProps {
                grid_type: "2-up".to_string(),
                gap: 8.0,
                cells: Vec::new(),
                animation: None,
                extra: PropertyMap::new(),
            }),
            ElementType::Divider => Self::Divider(DividerProps {
                color: "#D1D5DB".to_string(),
                thickness: 1.0,
                style: "solid".to_string(),
                animation: None,
                extra: PropertyMap::new(),
            }),
            ElementType::Spacer => Self::Spacer(SpacerProps {
                height: 40.0,
                animation: None,
                extra: PropertyMap::new(),
            }),
            ElementType::ContactForm => Self::Form(form_defaults(
                "Get In Touch",
                vec![
                    field("name", "text", "Name", "Your name"),
                    field("email", "email", "Email", "your@email.com"),
                    field("message", "textarea", "Message", "How can we help?"),
                ],
                "Send Message",
                "Thank you! We'll get back to you soon.",
            )),
            ElementType::CustomForm => Self::Form(form_defaults(
                "Custom Form",
                Vec::new(),
                "Submit",
                "Form submitted successfully!",
            )),
        }
    }

    /// Build typed properties from a stored map, filling missing keys with defaults
    pub fn from_value(ty: ElementType, value: Value) -> Result<Self, serde_json::Error> {
        let mut merged = Self::defaults(ty).to_map();
        if let Value::Object(stored) = value {
            merged.extend(stored);
        }
        Self::from_map(ty, merged)
    }

    fn from_map(ty: ElementType, map: PropertyMap) -> Result<Self, serde_json::Error> {
        let value = Value::Object(map);
        Ok(match Self::defaults(ty) {
            Self::Text(_) => Self::Text(serde_json::from_value(value)?),
            Self::Button(_) => Self::Button(serde_json::from_value(value)?),
            Self::Image(_) => Self::Image(serde_json::from_value(value)?),
            Self::Frame(_) => Self::Frame(serde_json::from_value(value)?),
            Self::Grid(_) => Self::Grid(serde_json::from_value(value)?),
            Self::Divider(_) => Self::Divider(serde_json::from_value(value)?),
            Self::Spacer(_) => Self::Spacer(serde_json::from_value(value)?),
            Self::Form(_) => Self::Form(serde_json::from_value(value)?),
        })
    }

    pub fn to_map(&self) -> PropertyMap {
        let value = match self {
            Self::Text(p) => serde_json::to_value(p),
            Self::Button(p) => serde_json::to_value(p),
            Self::Image(p) => serde_json::to_value(p),
            Self::Frame(p) => serde_json::to_value(p),
            Self::Grid(p) => serde_json::to_value(p),
            Self::Divider(p) => serde_json::to_value(p),
            Self::Spacer(p) => serde_json::to_value(p),
            Self::Form(p) => serde_json::to_value(p),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => PropertyMap::new(),
        }
    }

    /// Shallow-merge `patch` over these properties.
    ///
    /// A `null` in the patch removes the key, which falls back to the default.
    pub fn merged(&self, ty: ElementType, patch: &PropertyMap) -> Result<Self, serde_json::Error> {
        let mut map = self.to_map();
        for (key, value) in patch {
            if value.is_null() {
                map.remove(key);
            } else {
                map.insert(key.clone(), value.clone());
            }
        }
        Self::from_value(ty, Value::Object(map))
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Text(p) => Some(&p.content),
            Self::Button(p) => Some(&p.content),
            _ => None,
        }
    }

    pub fn font_size(&self) -> Option<f64> {
        match self {
            Self::Text(p) => Some(p.font_size),
            Self::Button(p) => Some(p.font_size),
            _ => None,
        }
    }

    pub fn set_font_size(&mut self, size: f64) {
        match self {
            Self::Text(p) => p.font_size = size,
            Self::Button(p) => p.font_size = size,
            _ => {}
        }
    }

    pub fn line_height(&self) -> Option<f64> {
        match self {
            Self::Text(p) => Some(p.line_height),
            _ => None,
        }
    }

    pub fn animation(&self) -> Option<&AnimationConfig> {
        match self {
            Self::Text(p) => p.animation.as_ref(),
            Self::Button(p) => p.animation.as_ref(),
            Self::Image(p) => p.animation.as_ref(),
            Self::Frame(p) => p.animation.as_ref(),
            Self::Grid(p) => p.animation.as_ref(),
            Self::Divider(p) => p.animation.as_ref(),
            Self::Spacer(p) => p.animation.as_ref(),
            Self::Form(p) => p.animation.as_ref(),
        }
    }
}

/// Wrap an angle into `[0, 360)`
pub fn normalize_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    degrees.rem_euclid(360.0)
}

/// A freely positioned node inside a blank section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ElementRecord", into = "ElementRecord")]
pub struct Element {
    pub id: ElementId,
    pub element_type: ElementType,
    /// Owning section (back-reference)
    pub section_id: SectionId,
    /// Creation geometry
    pub base: Rect,
    /// Viewport the creation geometry was laid out at
    pub origin: ViewportMode,
    pub breakpoints: Breakpoints,
    pub rotation: f64,
    pub z_index: u32,
    pub locked: bool,
    pub visible: bool,
    pub deletable: bool,
    pub props: ElementProps,
}

impl Element {
    pub fn new(
        id: ElementId,
        element_type: ElementType,
        section_id: SectionId,
        base: Rect,
        origin: ViewportMode,
    ) -> Self {
        let mut breakpoints = Breakpoints::new();
        breakpoints.set(origin, base);
        Self {
            id,
            element_type,
            section_id,
            base,
            origin,
            breakpoints,
            rotation: 0.0,
            z_index: 0,
            locked: false,
            visible: true,
            deletable: true,
            props: ElementProps::defaults(element_type),
        }
    }
}

/// Wire shape of an [`Element`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementRecord {
    id: ElementId,
    #[serde(rename = "type")]
    element_type: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    section_id: Option<SectionId>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default = "default_origin")]
    origin: ViewportMode,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    z_index: u32,
    #[serde(default)]
    locked: bool,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "default_true")]
    deletable: bool,
    #[serde(default)]
    properties: Value,
    #[serde(default)]
    breakpoints: Breakpoints,
}

fn default_origin() -> ViewportMode {
    ViewportMode::Desktop
}

fn default_true() -> bool {
    true
}

impl TryFrom<ElementRecord> for Element {
    type Error = String;

    fn try_from(record: ElementRecord) -> Result<Self, Self::Error> {
        let section_id = record
            .section_id
            .ok_or_else(|| format!("element {} has no section", record.id))?;
        let props = ElementProps::from_value(record.element_type, record.properties)
            .map_err(|e| format!("element {} has invalid properties: {}", record.id, e))?;

        Ok(Element {
            id: record.id,
            element_type: record.element_type,
            section_id,
            base: Rect::new(record.x, record.y, record.width, record.height),
            origin: record.origin,
            breakpoints: record.breakpoints,
            rotation: normalize_rotation(record.rotation),
            z_index: record.z_index,
            locked: record.locked,
            visible: record.visible,
            deletable: record.deletable,
            props,
        })
    }
}

impl From<Element> for ElementRecord {
    fn from(element: Element) -> Self {
        ElementRecord {
            id: element.id,
            element_type: element.element_type,
            section_id: Some(element.section_id),
            x: element.base.x,
            y: element.base.y,
            width: element.base.width,
            height: element.base.height,
            origin: element.origin,
            rotation: element.rotation,
            z_index: element.z_index,
            locked: element.locked,
            visible: element.visible,
            deletable: element.deletable,
            properties: Value::Object(element.props.to_map()),
            breakpoints: element.breakpoints,
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Section types. Anything other than `Blank` is a self-contained widget.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionKind {
    Blank,
    BookingWidget,
    GalleryWidget,
    ProductGrid,
    ReviewCarousel,
    ServiceWidget,
    ProductWidget,
    MenuWidget,
    EventsWidget,
    ClassesWidget,
    /// Widget kind this core does not know about, kept verbatim
    Custom(String),
}

impl SectionKind {
    pub fn as_str(&self) -> &str {
        match self {
            SectionKind::Blank => "blank",
            SectionKind::BookingWidget => "bookingWidget",
            SectionKind::GalleryWidget => "galleryWidget",
            SectionKind::ProductGrid => "productGrid",
            SectionKind::ReviewCarousel => "reviewCarousel",
            SectionKind::ServiceWidget => "serviceWidget",
            SectionKind::ProductWidget => "productWidget",
            SectionKind::MenuWidget => "menuWidget",
            SectionKind::EventsWidget => "eventsWidget",
            SectionKind::ClassesWidget => "classesWidget",
            SectionKind::Custom(kind) => kind,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, SectionKind::Blank)
    }

    pub fn default_height(&self) -> f64 {
        match self {
            SectionKind::BookingWidget | SectionKind::GalleryWidget => 500.0,
            SectionKind::ProductGrid => 450.0,
            _ => 400.0,
        }
    }

    pub fn default_properties(&self) -> SectionProperties {
        let mut props = SectionProperties {
            background_color: Some("transparent".to_string()),
            ..Default::default()
        };
        match self {
            SectionKind::BookingWidget => {
                props.heading = Some("Book an Appointment".to_string());
                props.accent_color = Some("#3B82F6".to_string());
                props.extra.insert("buttonText".to_string(), Value::from("Book Now"));
            }
            SectionKind::GalleryWidget => {
                props.heading = Some("Our Gallery".to_string());
                props.accent_color = Some("#1A1A1A".to_string());
                props.columns = Some(3);
                props.extra.insert("layout".to_string(), Value::from("masonry"));
                props.extra.insert("maxPhotos".to_string(), Value::from(9));
            }
            SectionKind::ProductGrid => {
                props.heading = Some("Our Services".to_string());
                props.accent_color = Some("#1A1A1A".to_string());
                props.columns = Some(3);
                props.extra.insert("showPrice".to_string(), Value::from(true));
            }
            SectionKind::ReviewCarousel => {
                props.heading = Some("What Our Clients Say".to_string());
                props.accent_color = Some("#1A1A1A".to_string());
                props.extra.insert("autoPlay".to_string(), Value::from(true));
            }
            _ => {}
        }
        props
    }
}

impl From<String> for SectionKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "blank" => SectionKind::Blank,
            "bookingWidget" => SectionKind::BookingWidget,
            "galleryWidget" => SectionKind::GalleryWidget,
            "productGrid" => SectionKind::ProductGrid,
            "reviewCarousel" => SectionKind::ReviewCarousel,
            "serviceWidget" => SectionKind::ServiceWidget,
            "productWidget" => SectionKind::ProductWidget,
            "menuWidget" => SectionKind::MenuWidget,
            "eventsWidget" => SectionKind::EventsWidget,
            "classesWidget" => SectionKind::ClassesWidget,
            _ => SectionKind::Custom(kind),
        }
    }
}

impl From<&str> for SectionKind {
    fn from(kind: &str) -> Self {
        SectionKind::from(kind.to_string())
    }
}

impl From<SectionKind> for String {
    fn from(kind: SectionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient")]
    pub columns: Option<u32>,
    #[serde(flatten)]
    pub extra: PropertyMap,
}

impl SectionProperties {
    /// Shallow-merge a patch; `null` clears a key
    pub fn merged(&self, patch: &PropertyMap) -> Result<Self, serde_json::Error> {
        let mut map = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => PropertyMap::new(),
        };
        for (key, value) in patch {
            if value.is_null() {
                map.remove(key);
            } else {
                map.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(Value::Object(map))
    }
}

/// Horizontal band of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SectionRecord")]
pub struct Section {
    pub id: SectionId,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub height: f64,
    #[serde(default)]
    pub properties: SectionProperties,
    /// Owned elements in paint order; `None` for widget sections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ElementId>>,
    #[serde(default)]
    pub locked: bool,
}

/// Wire form of a section; only `id` and `type` are required
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionRecord {
    id: SectionId,
    #[serde(rename = "type")]
    kind: SectionKind,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    height: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    properties: Option<SectionProperties>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    elements: Option<Vec<ElementId>>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    locked: Option<bool>,
}

impl From<SectionRecord> for Section {
    fn from(record: SectionRecord) -> Self {
        let height = record
            .height
            .filter(|h| h.is_finite() && *h > 0.0)
            .unwrap_or_else(|| record.kind.default_height());
        Section {
            id: record.id,
            height,
            properties: record.properties.unwrap_or_default(),
            elements: record.elements,
            locked: record.locked.unwrap_or(false),
            kind: record.kind,
        }
    }
}

impl Section {
    pub fn new(id: SectionId, kind: SectionKind) -> Self {
        let elements = kind.is_blank().then(Vec::new);
        Self {
            id,
            height: kind.default_height(),
            properties: kind.default_properties(),
            elements,
            locked: false,
            kind,
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    pub fn element_ids(&self) -> &[ElementId] {
        self.elements.as_deref().unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient")]
    pub transition: Option<PageTransition>,
    #[serde(flatten)]
    pub extra: PropertyMap,
}

/// A named website view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub slug: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub header_config: PropertyMap,
    #[serde(default)]
    pub footer_config: PropertyMap,
    #[serde(default)]
    pub canvas_config: CanvasConfig,
}

impl Page {
    pub fn new(id: PageId, title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            slug: slug.into(),
            sections: Vec::new(),
            header_config: PropertyMap::new(),
            footer_config: PropertyMap::new(),
            canvas_config: CanvasConfig::default(),
        }
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    pub fn section_index(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|s| &s.id == id)
    }
}
