use serde::Serialize;

use super::wire;
use super::{ApiClient, ApiError, is_false};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Contact {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub full_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone_number: String,
    #[serde(skip_serializing_if = "is_false")]
    pub cannot_message: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub img_url: String,
}

impl Contact {
    pub fn display_name(&self) -> &str {
        [&self.full_name, &self.username]
            .into_iter()
            .find(|value| !value.is_empty())
            .unwrap_or(&self.id)
    }
}

impl From<wire::User> for Contact {
    fn from(user: wire::User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.unwrap_or_default(),
            username: user.username.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            phone_number: user.phone_number.unwrap_or_default(),
            cannot_message: user.cannot_message,
            img_url: user.img_url.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub account_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Contact>,
}

impl ApiClient {
    pub async fn list_accounts(&self) -> Result<Vec<Account>, ApiError> {
        let accounts: Vec<wire::Account> = self.get(&["v1", "accounts"], &[]).await?;
        Ok(accounts
            .into_iter()
            .map(|account| Account {
                account_id: account.account_id,
                network: account.network.unwrap_or_default(),
                user: account.user.map(Contact::from),
            })
            .collect())
    }

    /// Finds contacts on a single account.
    pub async fn search_contacts(&self, account_id: &str, query: &str) -> Result<Vec<Contact>, ApiError> {
        let page: wire::Page<wire::User> = self
            .get(
                &["v1", "accounts", account_id, "contacts"],
                &[("query", query.to_string())],
            )
            .await?;
        Ok(page.items.into_iter().map(Contact::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn search_contacts_maps_items() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/accounts/whatsapp/contacts")
            .match_query(Matcher::UrlEncoded("query".into(), "jamie".into()))
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items":[
                    {"id":"u1","fullName":"Jamie Young","username":"jamie","phoneNumber":"+15550100","imgURL":"file:///a.png"},
                    {"id":"u2","cannotMessage":true}
                ]}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), "tok".to_string(), None).expect("client");
        let contacts = client.search_contacts("whatsapp", "jamie").await.expect("contacts");

        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].full_name, "Jamie Young");
        assert_eq!(contacts[0].phone_number, "+15550100");
        assert_eq!(contacts[0].img_url, "file:///a.png");
        assert!(!contacts[0].cannot_message);
        assert!(contacts[1].cannot_message);
        assert_eq!(contacts[1].display_name(), "u2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_accounts_maps_user() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/accounts")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"accountID":"telegram","network":"Telegram","user":{"id":"@me","fullName":"Me","isSelf":true}}]"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), "tok".to_string(), None).expect("client");
        let accounts = client.list_accounts().await.expect("accounts");
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_id, "telegram");
        assert_eq!(accounts[0].network, "Telegram");
        assert_eq!(accounts[0].user.as_ref().map(|user| user.display_name()), Some("Me"));
    }

    #[test]
    fn contact_json_omits_empty_fields() {
        let contact = Contact::from(wire::User {
            id: "u1".to_string(),
            username: Some("jamie".to_string()),
            ..wire::User::default()
        });
        let value = serde_json::to_value(&contact).expect("json");
        assert_eq!(value, serde_json::json!({"id": "u1", "username": "jamie"}));
    }
}
