use crate::category::Category;

/// Static binding of a category to its handler ("assistant") on the
/// conversation service.
///
/// The `description` doubles as the classifier's explanation of when the
/// category applies.
#[derive(Debug, Clone, Copy)]
pub struct HandlerConfig {
    pub category: Category,
    pub handler_name: &'static str,
    pub description: &'static str,
}

/// One row per dispatchable category. This table is the only place the
/// category → handler binding lives.
const HANDLERS: &[HandlerConfig] = &[
    HandlerConfig {
        category: Category::Travel,
        handler_name: "TravelAssistant",
        description: "Messages about trips, vacations, flights, hotels, or any travel-related queries.",
    },
    HandlerConfig {
        category: Category::Schedule,
        handler_name: "CalendarAssistant",
        description: "Messages about appointments, meetings, or time-specific events that don't involve sending emails.",
    },
    HandlerConfig {
        category: Category::Family,
        handler_name: "FamilyAssistant",
        description: "Messages related to family members, relationships, or household matters.",
    },
    HandlerConfig {
        category: Category::Todo,
        handler_name: "TodoAssistant",
        description: "Messages about tasks, to-do lists, or things that need to be done.",
    },
    HandlerConfig {
        category: Category::Document,
        handler_name: "DocumentAssistant",
        description: "Messages about creating, editing, or managing documents, files, or paperwork.",
    },
    HandlerConfig {
        category: Category::Email,
        handler_name: "GmailAssistant",
        description: "Messages about sending, responding to, or managing emails.",
    },
    HandlerConfig {
        category: Category::ScheduleEmail,
        handler_name: "ScheduleEmailAssistant",
        description: "Messages that involve both scheduling an event and sending an email about it.",
    },
    HandlerConfig {
        category: Category::General,
        handler_name: "GeneralAssistant",
        description: "Messages that don't fit into the other categories.",
    },
];

/// The internal classification handler. Not part of [`handlers`] because it
/// is never a dispatch destination.
const CLASSIFIER: HandlerConfig = HandlerConfig {
    category: Category::Classifier,
    handler_name: "ClassifierAssistant",
    description: "Classifies user inputs into appropriate categories.",
};

/// Look up the handler bound to a category. Total over the category set.
#[must_use]
pub fn handler_for(category: Category) -> &'static HandlerConfig {
    if category == Category::Classifier {
        return &CLASSIFIER;
    }
    HANDLERS
        .iter()
        .find(|h| h.category == category)
        // HANDLERS covers every dispatchable category; see the test below.
        .unwrap_or(&CLASSIFIER)
}

/// All dispatchable handler bindings.
#[must_use]
pub fn handlers() -> &'static [HandlerConfig] {
    HANDLERS
}

/// The internal classification handler binding.
#[must_use]
pub fn classifier_handler() -> &'static HandlerConfig {
    &CLASSIFIER
}
