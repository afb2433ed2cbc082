use serenity::all::{ButtonStyle, CreateActionRow, CreateButton, ReactionType};

pub const QUEUE_PREVIOUS: &str = "queue_previous";
pub const QUEUE_NEXT: &str = "queue_next";

/// Builds the custom id of a queue button, scoped to one queue message.
pub fn queue_button_id(action: &str, message_key: u64) -> String {
    format!("{}:{}", action, message_key)
}

/// Creates the ◀/▶ row for paging through the queue
pub fn queue_page_buttons(
    message_key: u64,
    page_index: usize,
    total_pages: usize,
) -> Vec<CreateActionRow> {
    let previous = CreateButton::new(queue_button_id(QUEUE_PREVIOUS, message_key))
        .emoji(ReactionType::Unicode("◀️".to_string()))
        .style(ButtonStyle::Secondary)
        .disabled(page_index == 0);

    let next = CreateButton::new(queue_button_id(QUEUE_NEXT, message_key))
        .emoji(ReactionType::Unicode("▶️".to_string()))
        .style(ButtonStyle::Secondary)
        .disabled(page_index + 1 >= total_pages);

    vec![CreateActionRow::Buttons(vec![previous, next])]
}

/// Page to show after a button press, or `None` for an unknown button.
pub fn page_after_press(
    custom_id: &str,
    message_key: u64,
    page_index: usize,
    total_pages: usize,
) -> Option<usize> {
    if custom_id == queue_button_id(QUEUE_PREVIOUS, message_key) {
        Some(page_index.saturating_sub(1))
    } else if custom_id == queue_button_id(QUEUE_NEXT, message_key) {
        Some((page_index + 1).min(total_pages.saturating_sub(1)))
    } else {
        None
    }
}
