use chrono::NaiveDate;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::SiiError;

pub type XmlResult = Result<String, SiiError>;

fn xml_io(e: std::io::Error) -> SiiError {
    SiiError::Xml(format!("XML write error: {e}"))
}

/// Event-based payload writer. Text content is escaped for `& < > " '`
/// by the underlying writer.
pub struct PayloadWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl PayloadWriter {
    pub fn new() -> Result<Self, SiiError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, SiiError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| SiiError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, SiiError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, SiiError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, SiiError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn empty_element(&mut self, name: &str) -> Result<&mut Self, SiiError> {
        self.writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, SiiError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Write a monetary or percentage element in wire format.
    pub fn amount_element(&mut self, name: &str, amount: Decimal) -> Result<&mut Self, SiiError> {
        self.text_element(name, &format_amount(amount))
    }

    /// Write a date element in wire format.
    pub fn date_element(&mut self, name: &str, date: NaiveDate) -> Result<&mut Self, SiiError> {
        self.text_element(name, &format_date(date))
    }
}

/// Format a Decimal for the wire — always at least 2 decimal places,
/// keeping extra precision where present.
pub fn format_amount(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}

/// Format a date as `DD-MM-YYYY`, the authority's date format.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}
