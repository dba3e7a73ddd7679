//! One user's responses, grouped by questionnaire and then by question.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{
    error::Result,
    model::{
        common::{AnswerId, QuestionId, QuestionnaireId, UserId},
        db::{AnswerOption, Question, Questionnaire},
        store::{AnswerOptionRepo, QuestionRepo, QuestionnaireRepo, ResponseRepo, Store},
    },
};

/// Questionnaire label → question label → rendered answers, in the order
/// they were first seen.
pub type UserResponses = IndexMap<String, IndexMap<String, Vec<String>>>;

/// A response as displayed: its text if there is any, otherwise the labels
/// of the selected options.
pub fn render_answer<S: AsRef<str>>(text_answer: &str, option_labels: &[S]) -> String {
    if text_answer.is_empty() {
        option_labels
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        text_answer.to_string()
    }
}

/// Group `(questionnaire label, question label, answer)` triples.
pub fn group_responses<I>(answers: I) -> UserResponses
where
    I: IntoIterator<Item = (String, String, String)>,
{
    let mut grouped = UserResponses::new();
    for (questionnaire, question, answer) in answers {
        grouped
            .entry(questionnaire)
            .or_default()
            .entry(question)
            .or_default()
            .push(answer);
    }
    grouped
}

/// Collect the responses of `user_id`, scanning them in ID order.
///
/// Each referenced record is loaded once. Responses whose question or
/// questionnaire no longer exists are skipped, as are selections of deleted
/// options.
pub async fn responses_for_user(store: &Store, user_id: UserId) -> Result<UserResponses> {
    let mut questions: HashMap<QuestionId, Option<Question>> = HashMap::new();
    let mut questionnaires: HashMap<QuestionnaireId, Option<Questionnaire>> = HashMap::new();
    let mut options: HashMap<AnswerId, Option<AnswerOption>> = HashMap::new();
    let mut answers = Vec::new();

    for response in store.responses_for_user(user_id).await? {
        let question = match questions.get(&response.question_id) {
            Some(question) => question.clone(),
            None => {
                let question = store.question(response.question_id).await?;
                questions.insert(response.question_id, question.clone());
                question
            }
        };
        let Some(question) = question else {
            debug!("Skipping response {} to a missing question", response.id);
            continue;
        };

        let questionnaire = match questionnaires.get(&question.questionnaire_id) {
            Some(questionnaire) => questionnaire.clone(),
            None => {
                let questionnaire = store.questionnaire(question.questionnaire_id).await?;
                questionnaires.insert(question.questionnaire_id, questionnaire.clone());
                questionnaire
            }
        };
        let Some(questionnaire) = questionnaire else {
            debug!("Skipping response {} to an orphaned question", response.id);
            continue;
        };

        for choice in &response.choice_answer {
            if !options.contains_key(choice) {
                let option = store.answer_option(*choice).await?;
                options.insert(*choice, option);
            }
        }
        let labels: Vec<&str> = response
            .choice_answer
            .iter()
            .filter_map(|choice| options.get(choice)?.as_ref())
            .map(|option| option.text.as_str())
            .collect();

        answers.push((
            questionnaire.description.clone(),
            question.question.question.clone(),
            render_answer(&response.text_answer, &labels),
        ));
    }

    Ok(group_responses(answers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::db::{AnswerOptionCore, NewQuestionnaire, QuestionCore, UserResponseCore};

    #[test]
    fn text_wins_over_labels() {
        assert_eq!(render_answer("I like sunny weather.", &["ignored"]), "I like sunny weather.");
        assert_eq!(
            render_answer("", &["I like shoes.", "I like shirt."]),
            "I like shoes., I like shirt."
        );
        assert_eq!(render_answer::<&str>("", &[]), "");
    }

    #[test]
    fn grouping_keeps_first_seen_order() {
        let triples = [
            ("B", "q1", "a"),
            ("A", "q2", "b"),
            ("B", "q3", "c"),
            ("B", "q1", "d"),
        ]
        .map(|(a, b, c)| (a.to_string(), b.to_string(), c.to_string()));
        let grouped = group_responses(triples);

        let questionnaires: Vec<_> = grouped.keys().collect();
        assert_eq!(questionnaires, vec!["B", "A"]);
        let questions: Vec<_> = grouped["B"].keys().collect();
        assert_eq!(questions, vec!["q1", "q3"]);
        assert_eq!(grouped["B"]["q1"], vec!["a", "d"]);
    }

    #[rocket::async_test]
    async fn weather_scenario() {
        let store = Store::memory();
        let questionnaire = store
            .insert_questionnaire(NewQuestionnaire::example())
            .await
            .unwrap();
        let question = store
            .insert_question(QuestionCore::text_example(questionnaire.id))
            .await
            .unwrap();
        store
            .insert_response(UserResponseCore::text_example(1, question.id))
            .await
            .unwrap();

        let grouped = responses_for_user(&store, 1).await.unwrap();
        let expected: UserResponses = [(
            "Weather questionnaire.".to_string(),
            [(
                "What kind of weather do you like?".to_string(),
                vec!["I like sunny weather.".to_string()],
            )]
            .into_iter()
            .collect(),
        )]
        .into_iter()
        .collect();
        assert_eq!(grouped, expected);

        assert!(responses_for_user(&store, 2).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn choices_rendered_as_labels() {
        let store = Store::memory();
        let questionnaire = store
            .insert_questionnaire(NewQuestionnaire::example2())
            .await
            .unwrap();
        let question = store
            .insert_question(QuestionCore::multiple_choice_example(questionnaire.id))
            .await
            .unwrap();
        let shoes = store
            .insert_answer_option(AnswerOptionCore::example(question.id))
            .await
            .unwrap();
        let shirt = store
            .insert_answer_option(AnswerOptionCore::example2(question.id))
            .await
            .unwrap();
        store
            .insert_response(UserResponseCore::choice_example(
                5,
                question.id,
                vec![shirt.id, shoes.id],
            ))
            .await
            .unwrap();

        let grouped = responses_for_user(&store, 5).await.unwrap();
        assert_eq!(
            grouped["Clothes questionnaire."]["What kind of games do you like?"],
            vec!["I like shoes., I like shirt."]
        );
    }
}
