use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub chat_id: Uuid,
    #[polar(attribute)]
    pub sender_id: Uuid,
    pub text: String,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(chat_id: Uuid, sender_id: Uuid, text: &str) -> Result<Self, Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            chat_id,
            sender_id,
            text: message_text(text)?,
            is_edited: false,
            created_at: Utc::now(),
            edited_at: None,
        })
    }

    pub fn edit(&mut self, text: &str) -> Result<(), Error> {
        self.text = message_text(text)?;
        self.is_edited = true;
        self.edited_at = Some(Utc::now());

        Ok(())
    }
}

fn message_text(text: &str) -> Result<String, Error> {
    let text = text.trim();

    if text.is_empty() {
        return Err(Error::invalid_input_error("message text is required"));
    }

    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_refused() {
        let err = Message::new(Uuid::new_v4(), Uuid::new_v4(), " \n ").unwrap_err();
        assert!(err.is_invalid_input_error());
    }

    #[test]
    fn edit_marks_the_message() {
        let mut message = Message::new(Uuid::new_v4(), Uuid::new_v4(), "at the gate").unwrap();
        assert!(!message.is_edited);

        message.edit(" at gate 2 ").unwrap();

        assert_eq!(message.text, "at gate 2");
        assert!(message.is_edited);
        assert!(message.edited_at.is_some());

        assert!(message.edit("").unwrap_err().is_invalid_input_error());
        assert_eq!(message.text, "at gate 2");
    }
}
