use serde_json::{json, Value};

use super::activity::{Attachment, Document, ADAPTIVE_CARD_CONTENT_TYPE};

/// Renders the submitted document: icon on the left, name, author and modification date on
/// the right, and a "View" button opening the document.
pub fn document_card(document: &Document, hostname: &str) -> Attachment {
    return Attachment {
        content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
        content: document_card_content(document, hostname),
    };
}

fn document_card_content(document: &Document, hostname: &str) -> Value {
    return json!({
        "type": "AdaptiveCard",
        "body": [
            {
                "type": "ColumnSet",
                "columns": [
                    {
                        "type": "Column",
                        "width": 25,
                        "items": [
                            {
                                "type": "Image",
                                "url": format!("https://{}/assets/icon.png", hostname),
                                "style": "Person"
                            }
                        ]
                    },
                    {
                        "type": "Column",
                        "width": 75,
                        "items": [
                            {
                                "type": "TextBlock",
                                "text": document.name,
                                "size": "Large",
                                "weight": "Bolder"
                            },
                            {
                                "type": "TextBlock",
                                "text": format!("Author: {}", document.author)
                            },
                            {
                                "type": "TextBlock",
                                "text": format!("Modified: {}", document.modified)
                            }
                        ]
                    }
                ]
            }
        ],
        "actions": [
            {
                "type": "Action.OpenUrl",
                "title": "View",
                "url": document.url
            }
        ],
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "version": "1.0"
    });
}

#[cfg(test)]
mod test {
    use super::*;

    fn document() -> Document {
        return Document {
            name: "Quarterly report.docx".to_string(),
            author: "Megan Bowen".to_string(),
            modified: "2024-03-18".to_string(),
            url: "https://contoso.sharepoint.com/sites/finance/report.docx".to_string(),
        };
    }

    #[test]
    fn test_document_card_content_type() {
        let card = document_card(&document(), "contoso.ngrok.io");

        assert_eq!(card.content_type, "application/vnd.microsoft.card.adaptive");
        assert_eq!(card.content["version"], "1.0");
        assert_eq!(card.content["type"], "AdaptiveCard");
    }

    #[test]
    fn test_document_card_renders_document_fields() {
        let card = document_card(&document(), "contoso.ngrok.io");
        let columns = &card.content["body"][0]["columns"];

        assert_eq!(columns[0]["width"], 25);
        assert_eq!(columns[0]["items"][0]["url"], "https://contoso.ngrok.io/assets/icon.png");
        assert_eq!(columns[1]["width"], 75);
        assert_eq!(columns[1]["items"][0]["text"], "Quarterly report.docx");
        assert_eq!(columns[1]["items"][1]["text"], "Author: Megan Bowen");
        assert_eq!(columns[1]["items"][2]["text"], "Modified: 2024-03-18");
        assert_eq!(card.content["actions"][0]["type"], "Action.OpenUrl");
        assert_eq!(card.content["actions"][0]["url"], "https://contoso.sharepoint.com/sites/finance/report.docx");
    }
}
