//! Outbound message content.
//!
//! DESIGN
//! ======
//! Pages describe what they want on screen with these plain types; the
//! `Responder` turns them into platform payloads. Nothing here knows about
//! HTTP or the platform's JSON shape.

use serde::Serialize;

// =============================================================================
// PANELS
// =============================================================================

/// Accent colour for error banners.
pub const ERROR_COLOR: u32 = 0x00E7_4C3C;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PanelField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Titled informational block rendered above the controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<PanelField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// Image reference, either a URL or `attachment://<filename>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Panel {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(PanelField { name: name.into(), value: value.into(), inline });
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

// =============================================================================
// CONTROLS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub default: bool,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into(), description: None, default: false }
    }

    #[must_use]
    pub fn selected(mut self, default: bool) -> Self {
        self.default = default;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Component {
    Button {
        custom_id: String,
        label: String,
        style: ButtonStyle,
        disabled: bool,
    },
    Select {
        custom_id: String,
        placeholder: String,
        options: Vec<SelectOption>,
        min_values: u8,
        max_values: u8,
        disabled: bool,
    },
}

impl Component {
    pub fn button(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self::Button { custom_id: custom_id.into(), label: label.into(), style, disabled: false }
    }

    pub fn select(custom_id: impl Into<String>, placeholder: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::Select {
            custom_id: custom_id.into(),
            placeholder: placeholder.into(),
            options,
            min_values: 1,
            max_values: 1,
            disabled: false,
        }
    }

    #[must_use]
    pub fn disabled(mut self, value: bool) -> Self {
        match &mut self {
            Self::Button { disabled, .. } | Self::Select { disabled, .. } => *disabled = value,
        }
        self
    }

    #[must_use]
    pub fn custom_id(&self) -> &str {
        match self {
            Self::Button { custom_id, .. } | Self::Select { custom_id, .. } => custom_id,
        }
    }
}

/// One horizontal row of controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionRow(pub Vec<Component>);

// =============================================================================
// ATTACHMENTS
// =============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { filename: filename.into(), bytes }
    }

    /// Guess a MIME type from the file extension.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        let ext = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// =============================================================================
// MESSAGE
// =============================================================================

/// Everything shown in one interaction response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundMessage {
    pub content: String,
    pub panels: Vec<Panel>,
    pub rows: Vec<ActionRow>,
    pub attachments: Vec<Attachment>,
}

impl OutboundMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), ..Self::default() }
    }

    /// Red banner with no controls. Terminal screens use this.
    pub fn error_banner(message: impl Into<String>) -> Self {
        let panel = Panel::new("Something went wrong")
            .with_description(message)
            .with_color(ERROR_COLOR);
        Self { panels: vec![panel], ..Self::default() }
    }

    #[must_use]
    pub fn with_panel(mut self, panel: Panel) -> Self {
        self.panels.push(panel);
        self
    }

    #[must_use]
    pub fn with_row(mut self, components: Vec<Component>) -> Self {
        self.rows.push(ActionRow(components));
        self
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments.extend(attachments);
        self
    }

    /// Drop every control and attachment, keeping text and panels.
    #[must_use]
    pub fn without_components(mut self) -> Self {
        self.rows.clear();
        self.attachments.clear();
        self
    }

    /// Append a line below whatever content the page produced.
    #[must_use]
    pub fn with_status_line(mut self, line: &str) -> Self {
        if !self.content.is_empty() {
            self.content.push('\n');
        }
        self.content.push_str(line);
        self
    }
}

// =============================================================================
// MODALS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextInputStyle {
    Short,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub style: TextInputStyle,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
}

impl TextInput {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: TextInputStyle) -> Self {
        Self { custom_id: custom_id.into(), label: label.into(), style, required: true, value: None, max_length: None }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn prefilled(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A platform form dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModalSpec {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

impl ModalSpec {
    pub fn new(custom_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { custom_id: custom_id.into(), title: title.into(), inputs: Vec::new() }
    }

    #[must_use]
    pub fn with_input(mut self, input: TextInput) -> Self {
        self.inputs.push(input);
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
