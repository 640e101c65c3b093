use crate::ActionId;

/// Parse DBus action array (alternating id/label pairs) into structured actions
///
/// DBus format: ["id1", "label1", "id2", "label2", ...]. A trailing id without
/// a label is dropped.
pub fn parse_actions<S: AsRef<str>>(raw_actions: &[S]) -> Vec<(ActionId, String)> {
    raw_actions
        .chunks_exact(2)
        .map(|chunk| {
            let id = match chunk[0].as_ref() {
                "default" => ActionId::Default,
                id => ActionId::Custom(id.to_string()),
            };
            (id, chunk[1].as_ref().to_string())
        })
        .collect()
}

/// The action triggered when the notification body itself is activated.
///
/// Prefers the `"default"` action, then falls back to the first action.
pub fn default_action(actions: &[(ActionId, String)]) -> Option<&ActionId> {
    actions
        .iter()
        .find(|(id, _)| matches!(id, ActionId::Default))
        .or_else(|| actions.first())
        .map(|(id, _)| id)
}

/// Get non-default actions (for displaying as buttons)
pub fn button_actions(actions: &[(ActionId, String)]) -> Vec<&(ActionId, String)> {
    actions
        .iter()
        .filter(|(id, _)| !matches!(id, ActionId::Default))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_pairs() {
        let actions = parse_actions(&["reply", "Reply", "mark_read", "Mark as Read"]);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], (ActionId::Custom("reply".into()), "Reply".into()));
        assert_eq!(actions[1].1, "Mark as Read");
    }

    #[test]
    fn test_parse_odd_length_drops_trailing_id() {
        let actions = parse_actions(&["default", "Open", "orphan"]);
        assert_eq!(actions, vec![(ActionId::Default, "Open".to_string())]);
    }

    #[test]
    fn test_default_action_prefers_default_id() {
        let actions = parse_actions(&["reply", "Reply", "default", "Open"]);
        assert_eq!(default_action(&actions), Some(&ActionId::Default));
    }

    #[test]
    fn test_default_action_falls_back_to_first() {
        let actions = parse_actions(&["reply", "Reply", "archive", "Archive"]);
        assert_eq!(
            default_action(&actions),
            Some(&ActionId::Custom("reply".into()))
        );
    }

    #[test]
    fn test_default_action_none_when_empty() {
        assert_eq!(default_action(&[]), None);
    }

    #[test]
    fn test_button_actions_exclude_default() {
        let actions = parse_actions(&["default", "Open", "reply", "Reply"]);
        let buttons = button_actions(&actions);
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].1, "Reply");
    }
}
