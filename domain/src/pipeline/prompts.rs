//! System instructions for each generation step.

use meeting_ai::GenerationOptions;

pub(crate) struct Prompt {
    pub instructions: &'static str,
    pub options: GenerationOptions,
}

const FACTUAL: GenerationOptions = GenerationOptions {
    max_output_length: 1500,
    randomness: 0.2,
};

const CREATIVE: GenerationOptions = GenerationOptions {
    max_output_length: 3000,
    randomness: 0.6,
};

const STRUCTURED: GenerationOptions = GenerationOptions {
    max_output_length: 2500,
    randomness: 0.0,
};

pub(crate) const SUMMARIZE: Prompt = Prompt {
    instructions: "You summarize meeting transcripts. Write a concise summary of the \
        discussion in two or three short paragraphs. Do not invent facts.",
    options: FACTUAL,
};

pub(crate) const KEY_THEMES: Prompt = Prompt {
    instructions: "List the key themes discussed in this meeting transcript as a \
        markdown bullet list, one theme per line, most important first.",
    options: FACTUAL,
};

pub(crate) const DECISIONS: Prompt = Prompt {
    instructions: "List every decision that was made in this meeting transcript as a \
        markdown bullet list. If no decisions were made, answer with a single bullet \
        saying so.",
    options: FACTUAL,
};

pub(crate) const DRAFT_STRATEGY: Prompt = Prompt {
    instructions: "Using the meeting summary, key themes and decisions provided, draft a \
        strategy document in markdown with '#' and '##' headings, short paragraphs and \
        '-' bullet lists. Cover goals, recommended actions, risks and next steps.",
    options: CREATIVE,
};

pub(crate) const REFINE_STRATEGY: Prompt = Prompt {
    instructions: "Refine this strategy draft. Tighten the wording, remove repetition, \
        keep the markdown structure, and return only the improved document.",
    options: CREATIVE,
};

pub(crate) const EXTRACT_ACTION_ITEMS: Prompt = Prompt {
    instructions: "Extract every action item from this meeting transcript as a markdown \
        bullet list. Each bullet is one concrete task.",
    options: FACTUAL,
};

pub(crate) const IDENTIFY_OWNERS: Prompt = Prompt {
    instructions: "For each action item, name the person responsible according to the \
        transcript. Answer with one bullet per item in the form 'item: owner'. Use \
        'Unassigned' when nobody took ownership.",
    options: FACTUAL,
};

pub(crate) const IDENTIFY_DEADLINES: Prompt = Prompt {
    instructions: "For each action item, give the deadline mentioned in the transcript. \
        Answer with one bullet per item in the form 'item: deadline'. Use 'None' when \
        no deadline was mentioned.",
    options: FACTUAL,
};

pub(crate) const PRIORITIZE_ACTION_ITEMS: Prompt = Prompt {
    instructions: "Combine the action items, owners and deadlines into a JSON array \
        ordered by priority. Each element is an object with the string fields \
        \"action\", \"owner\", \"deadline\" and \"priority\" (one of \"high\", \
        \"medium\", \"low\"). Answer with the JSON array only.",
    options: STRUCTURED,
};

pub(crate) const SUMMARIZE_ACTION_ITEMS: Prompt = Prompt {
    instructions: "Write a short executive summary of these prioritized action items and \
        the meeting they came from, in plain paragraphs.",
    options: FACTUAL,
};

pub(crate) const REVIEW_REPORT: Prompt = Prompt {
    instructions: "Review this action item summary for accuracy against the items \
        provided. Fix anything inconsistent and return only the corrected summary.",
    options: FACTUAL,
};
