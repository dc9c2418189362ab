use markup_shared::location::TextRange;
use serde::Deserialize;
use std::fmt;

/// Decides which events besides tag starts and ends a consumer receives
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingOrder {
    Tags,
    TagsAndAttributes,
    TagsAndTexts,
    #[default]
    TagsAndAttributesAndTexts,
}

impl ProcessingOrder {
    pub fn wants_attributes(&self) -> bool {
        matches!(
            self,
            ProcessingOrder::TagsAndAttributes | ProcessingOrder::TagsAndAttributesAndTexts
        )
    }

    pub fn wants_texts(&self) -> bool {
        matches!(
            self,
            ProcessingOrder::TagsAndTexts | ProcessingOrder::TagsAndAttributesAndTexts
        )
    }

    /// Events that both orders ask for
    pub fn intersect(&self, other: ProcessingOrder) -> ProcessingOrder {
        let attributes = self.wants_attributes() && other.wants_attributes();
        let texts = self.wants_texts() && other.wants_texts();

        match (attributes, texts) {
            (true, true) => ProcessingOrder::TagsAndAttributesAndTexts,
            (true, false) => ProcessingOrder::TagsAndAttributes,
            (false, true) => ProcessingOrder::TagsAndTexts,
            (false, false) => ProcessingOrder::Tags,
        }
    }
}

/// Receiver of the events the builder driver produces while walking a syntax tree
pub trait EventSink {
    /// The doctype of the document, reported once before any tag
    fn doctype(&mut self, _public_id: Option<&str>, _system_id: Option<&str>, _range: TextRange) {}

    /// Start of a tag. The returned order decides which events are reported for the direct
    /// children of this tag.
    fn tag_start(
        &mut self,
        local_name: &str,
        namespace: &str,
        range: TextRange,
        header_end: usize,
    ) -> ProcessingOrder;

    fn tag_end(&mut self, local_name: &str, namespace: &str, range: TextRange);

    fn attribute(&mut self, _name: &str, _value: &str, _range: TextRange) {}

    /// A piece of character data. `display` is the decoded text, `source` the text as written.
    fn text(&mut self, _display: &str, _source: &str, _range: TextRange) {}

    fn entity_ref(&mut self, _reference: &str, _range: TextRange) {}

    fn error(&mut self, _message: &str, _range: TextRange) {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Doctype {
        public_id: Option<String>,
        system_id: Option<String>,
        range: TextRange,
    },
    TagStart {
        name: String,
        namespace: String,
        range: TextRange,
        header_end: usize,
    },
    TagEnd {
        name: String,
        namespace: String,
        range: TextRange,
    },
    Attribute {
        name: String,
        value: String,
        range: TextRange,
    },
    Text {
        display: String,
        source: String,
        range: TextRange,
    },
    EntityRef {
        reference: String,
        range: TextRange,
    },
    Error {
        message: String,
        range: TextRange,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Doctype {
                public_id,
                system_id,
                range,
            } => write!(
                f,
                "doctype public={} system={} [{range}]",
                public_id.as_deref().unwrap_or("-"),
                system_id.as_deref().unwrap_or("-")
            ),
            Event::TagStart {
                name,
                namespace,
                range,
                header_end,
            } => write!(f, "tag_start {name} ns={namespace:?} [{range}] header_end={header_end}"),
            Event::TagEnd {
                name,
                namespace,
                range,
            } => write!(f, "tag_end {name} ns={namespace:?} [{range}]"),
            Event::Attribute { name, value, range } => {
                write!(f, "attribute {name}={value:?} [{range}]")
            }
            Event::Text {
                display,
                source,
                range,
            } => write!(f, "text {display:?} source={source:?} [{range}]"),
            Event::EntityRef { reference, range } => write!(f, "entity_ref {reference} [{range}]"),
            Event::Error { message, range } => write!(f, "error {message:?} [{range}]"),
        }
    }
}

/// Sink that records every event it receives
#[derive(Clone, Debug, Default)]
pub struct EventCollector {
    pub events: Vec<Event>,
    /// Order returned for every tag
    order: ProcessingOrder,
}

impl EventCollector {
    pub fn new(order: ProcessingOrder) -> Self {
        Self {
            events: Vec::new(),
            order,
        }
    }
}

impl EventSink for EventCollector {
    fn doctype(&mut self, public_id: Option<&str>, system_id: Option<&str>, range: TextRange) {
        self.events.push(Event::Doctype {
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
            range,
        });
    }

    fn tag_start(
        &mut self,
        local_name: &str,
        namespace: &str,
        range: TextRange,
        header_end: usize,
    ) -> ProcessingOrder {
        self.events.push(Event::TagStart {
            name: local_name.to_string(),
            namespace: namespace.to_string(),
            range,
            header_end,
        });
        self.order
    }

    fn tag_end(&mut self, local_name: &str, namespace: &str, range: TextRange) {
        self.events.push(Event::TagEnd {
            name: local_name.to_string(),
            namespace: namespace.to_string(),
            range,
        });
    }

    fn attribute(&mut self, name: &str, value: &str, range: TextRange) {
        self.events.push(Event::Attribute {
            name: name.to_string(),
            value: value.to_string(),
            range,
        });
    }

    fn text(&mut self, display: &str, source: &str, range: TextRange) {
        self.events.push(Event::Text {
            display: display.to_string(),
            source: source.to_string(),
            range,
        });
    }

    fn entity_ref(&mut self, reference: &str, range: TextRange) {
        self.events.push(Event::EntityRef {
            reference: reference.to_string(),
            range,
        });
    }

    fn error(&mut self, message: &str, range: TextRange) {
        self.events.push(Event::Error {
            message: message.to_string(),
            range,
        });
    }
}
