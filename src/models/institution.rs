use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "institution", rename_all = "camelCase")]
pub struct Institution {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_home_app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_logon_app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct Institutions {
    #[serde(rename = "institution", default)]
    pub(crate) institutions: Vec<Institution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionDetails {
    pub institution: Institution,
    #[serde(default)]
    pub login_form: LoginForm,
}

/// One credential prompt of an institution's login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "loginField", rename_all = "camelCase")]
pub struct LoginField {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_length_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_length_max: Option<u32>,
}

impl LoginField {
    pub fn new(id: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value: Some(value.into()),
            display_order: None,
            mask: None,
            description: None,
            instructions: None,
            value_length_min: None,
            value_length_max: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "loginForm")]
pub struct LoginForm {
    #[serde(rename = "loginField", default)]
    pub login_fields: Vec<LoginField>,
}

impl LoginForm {
    /// Set the value of the field at `index` in display order of the form.
    pub fn set_value(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.login_fields.get_mut(index) {
            Some(field) => {
                field.value = Some(value.into());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::from_xml;

    #[test]
    fn parses_institution_details() {
        let details: InstitutionDetails = from_xml(
            r#"<institutionDetails>
               <institution>
                  <id>11863</id>
                  <name>Clearfield Bank &amp; Trust Co</name>
                  <accountTypeDescription>Banking</accountTypeDescription>
                  <currency>USD</currency>
                  <address>
                     <city>Clearfield</city>
                     <postalCode>16830</postalCode>
                  </address>
               </institution>
               <loginForm>
                  <loginField>
                     <id>11863001</id>
                     <name>ID</name>
                     <displayOrder>1</displayOrder>
                     <mask>false</mask>
                  </loginField>
                  <loginField>
                     <id>11863002</id>
                     <name>PIN</name>
                     <displayOrder>2</displayOrder>
                     <mask>true</mask>
                  </loginField>
               </loginForm>
            </institutionDetails>"#,
        )
        .unwrap();
        assert_eq!(details.institution.name, "Clearfield Bank & Trust Co");
        let address = details.institution.address.unwrap();
        assert_eq!(address.postal_code.as_deref(), Some("16830"));
        assert_eq!(details.login_form.login_fields.len(), 2);
        assert_eq!(details.login_form.login_fields[1].mask, Some(true));
    }

    #[test]
    fn set_value_is_bounded() {
        let mut form = LoginForm {
            login_fields: vec![LoginField::new("1", "ID", "")],
        };
        assert!(form.set_value(0, "tfa_text"));
        assert!(!form.set_value(1, "go"));
        assert_eq!(form.login_fields[0].value.as_deref(), Some("tfa_text"));
    }
}
