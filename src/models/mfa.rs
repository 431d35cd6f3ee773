use crate::error::{FinicityError, ParseError};
use crate::xml::from_xml;
use log::debug;
use serde::{Deserialize, Serialize};

/// One selectable answer; `value` is what gets sent back as the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(rename = "@value")]
    pub value: String,
    #[serde(rename = "$text", default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "question")]
pub struct MfaQuestion {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "choice", default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(rename = "imageChoice", default, skip_serializing_if = "Vec::is_empty")]
    pub image_choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl MfaQuestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
            choices: Vec::new(),
            image_choices: Vec::new(),
            answer: None,
        }
    }

    pub fn set_answer(&mut self, answer: impl Into<String>) {
        self.answer = Some(answer.into());
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Questions {
    #[serde(rename = "question", default)]
    pub(crate) question: Vec<MfaQuestion>,
}

/// A group of questions answered together in one follow-up call.
///
/// `session` is not part of the XML payload; it is copied from the
/// `MFA-Session` response header of the call that raised the challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "mfaChallenges")]
pub struct MfaChallenge {
    #[serde(skip)]
    pub session: String,
    #[serde(with = "questions")]
    pub questions: Vec<MfaQuestion>,
}

mod questions {
    use super::{MfaQuestion, Questions};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S: Serializer>(
        questions: &[MfaQuestion],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        Questions {
            question: questions.to_vec(),
        }
        .serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<MfaQuestion>, D::Error> {
        Ok(Questions::deserialize(deserializer)?.question)
    }
}

/// Challenges returned with a 203, all bound to the same session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSet {
    pub session: String,
    pub challenges: Vec<MfaChallenge>,
}

impl ChallengeSet {
    /// Parse a 203 body and stamp `session` onto every challenge.
    ///
    /// Accepts both the `<accounts><mfaChallenges>…` envelope and a bare
    /// `<mfaChallenges>` root.
    pub fn parse(body: &str, session: &str) -> Result<Self, ParseError> {
        let envelope: ChallengeEnvelope = from_xml(body)?;
        let mut challenges = envelope.mfa_challenges;
        if challenges.is_empty() && !envelope.questions.question.is_empty() {
            challenges.push(MfaChallenge {
                session: String::new(),
                questions: envelope.questions.question,
            });
        }
        for challenge in &mut challenges {
            challenge.session = session.to_string();
        }
        debug!(
            "Parsed {} MFA challenge(s) with {} question(s)",
            challenges.len(),
            challenges.iter().map(|c| c.questions.len()).sum::<usize>()
        );
        Ok(Self {
            session: session.to_string(),
            challenges,
        })
    }

    pub fn questions(&self) -> impl Iterator<Item = &MfaQuestion> {
        self.challenges.iter().flat_map(|c| c.questions.iter())
    }

    pub fn questions_mut(&mut self) -> impl Iterator<Item = &mut MfaQuestion> {
        self.challenges.iter_mut().flat_map(|c| c.questions.iter_mut())
    }

    /// Fill every question's answer from `answer_for`, in document order.
    pub fn answer_with<F>(&mut self, mut answer_for: F)
    where
        F: FnMut(&MfaQuestion) -> String,
    {
        for question in self.questions_mut() {
            let answer = answer_for(question);
            question.set_answer(answer);
        }
    }

    pub fn is_answered(&self) -> bool {
        self.questions().all(MfaQuestion::is_answered)
    }

    /// Body for the add-all/discover follow-up calls.
    pub(crate) fn to_request(&self) -> Result<AccountMfaChallenge, FinicityError> {
        if !self.is_answered() {
            return Err(FinicityError::InvalidParameter(
                "every MFA question needs an answer before resubmitting",
            ));
        }
        Ok(AccountMfaChallenge {
            mfa_challenges: self.challenges.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChallengeEnvelope {
    #[serde(rename = "mfaChallenges", default)]
    mfa_challenges: Vec<MfaChallenge>,
    #[serde(default)]
    questions: Questions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "accounts")]
pub(crate) struct AccountMfaChallenge {
    #[serde(rename = "mfaChallenges")]
    pub(crate) mfa_challenges: Vec<MfaChallenge>,
}
