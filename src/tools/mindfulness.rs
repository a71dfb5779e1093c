//! Mindfulness practices: breathwork, body scan, values check-in, 5-4-3-2-1 grounding.

use std::sync::Arc;

use serde_json::{Value, json};

use super::{PureTool, ToolSet, u32_arg_or};

pub const ONE_BREATH: &str = "**One Breath Practice**

Right now, wherever you are:

1. **Pause** what you're doing
2. **Inhale** slowly through your nose for 4 counts
3. **Hold** gently for 2 counts
4. **Exhale** slowly through your mouth for 6 counts

That's it. One breath.

Notice: did anything shift, even slightly? Your shoulders? Your jaw? Your racing thoughts?

You can return to this breath any time: in a meeting, before a difficult conversation, when emotions spike.

**If you'd like to continue:** repeat this pattern 3-5 more times, letting each exhale be a little longer and softer than the last.";

pub const VALUES_CHECKIN: &str = "**Values Check-In: What Matters Most?**

Values are like a compass. They point toward what gives your life meaning, even when the path is hard.

**1. Imagine your 80th birthday.** People who love you are sharing what they appreciate about you. What do you hope they'd say about how you treated others, what you stood for, how you handled challenges?

**2. What makes you come alive?** Think of a moment when you felt most yourself. What were you doing, who were you with, and what value was being honored?

**3. Choose 3-5 core values:** connection, growth, creativity, contribution, adventure, health, authenticity, achievement, peace, justice, spirituality, independence, play.

**4. The gap check.** Which values are you living in alignment with? Which have you drifted from? What's one small action this week that would honor a neglected value?

Values aren't goals; they're never \"done\". It's okay if they shift over time.

**Reflection:** if you were 10% more aligned with your top value this week, what would you be doing differently?";

const BRIEF_SCAN: &[&str] = &["feet", "belly", "chest", "shoulders", "face"];
const MODERATE_SCAN: &[&str] = &[
    "feet and legs",
    "pelvis and lower back",
    "belly and chest",
    "arms and hands",
    "shoulders and neck",
    "face and head",
];
const DETAILED_SCAN: &[&str] = &[
    "toes and feet",
    "ankles and calves",
    "knees and thighs",
    "pelvis and hips",
    "lower back and belly",
    "chest and upper back",
    "shoulders",
    "arms and hands",
    "neck and throat",
    "jaw and face",
    "head and scalp",
];

pub fn body_scan(duration: u32) -> Value {
    let (parts, seconds_per_part, detail) = if duration <= 3 {
        (BRIEF_SCAN, 30, "brief")
    } else if duration <= 7 {
        (MODERATE_SCAN, 45, "moderate")
    } else {
        (DETAILED_SCAN, 50, "detailed")
    };

    let script: Vec<Value> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let offset = i as u32 * seconds_per_part;
            json!({
                "body_area": part,
                "approximate_time": format!("{}:{:02}", offset / 60, offset % 60),
                "guidance": format!("Bring gentle awareness to your {}. Notice any sensations, warmth, coolness, tingling, tension, or maybe nothing at all. No need to change anything. Just notice, and breathe.", part),
                "duration_seconds": seconds_per_part,
            })
        })
        .collect();

    json!({
        "practice_name": "Body Scan Meditation",
        "duration_minutes": duration,
        "detail_level": detail,
        "preparation": {
            "instruction": "Find a comfortable position, sitting or lying down. Close your eyes or soften your gaze downward.",
            "initial_breaths": "Take 3 deep breaths to arrive in this moment.",
            "intention": "The intention is not to relax. It's simply to notice what's present in your body without judgment.",
        },
        "script": script,
        "closing": {
            "instruction": "Gradually expand your awareness to your whole body, breathing and alive.",
            "integration": "Take 3 more deep breaths. When you're ready, wiggle fingers and toes and open your eyes.",
            "reflection": "How do you feel now compared to when you started?",
        },
        "tips": [
            "If your mind wanders (it will), gently guide it back to the body area you're focusing on",
            "There's no 'perfect' way to feel. Boredom, restlessness, sleepiness are all welcome",
            format!("Consider setting a gentle timer for {} minutes", duration),
        ],
    })
}

const SENSES: &[(&str, u32, &str, &str)] = &[
    (
        "sight",
        5,
        "**5 things you can SEE**\nLook around you. Name 5 things you can see right now.",
        "Really look. Notice small details you usually overlook.",
    ),
    (
        "touch",
        4,
        "**4 things you can TOUCH**\nNotice 4 physical sensations, objects or what's already touching you.",
        "Press your feet firmly into the ground. Notice temperature, texture, pressure.",
    ),
    (
        "hearing",
        3,
        "**3 things you can HEAR**\nPause and listen. What sounds are present, even faint ones?",
        "Close your eyes for a moment if it helps. Notice sounds both near and far.",
    ),
    (
        "smell",
        2,
        "**2 things you can SMELL**\nWhat do you notice in the air? If nothing obvious, notice that.",
        "If you can't smell anything, imagine a scent you love. Your brain will respond.",
    ),
    (
        "taste",
        1,
        "**1 thing you can TASTE**\nWhat do you taste right now? Or what's a taste you enjoy?",
        "If nothing is present, imagine biting into a lemon.",
    ),
];

/// 5-4-3-2-1 sensory grounding.
pub fn grounding_exercise(duration: u32) -> Value {
    let exercise: serde_json::Map<String, Value> = SENSES
        .iter()
        .map(|(sense, count, prompt, tip)| {
            (
                sense.to_string(),
                json!({"count": count, "prompt": prompt, "tip": tip}),
            )
        })
        .collect();

    json!({
        "technique": "5-4-3-2-1 Sensory Grounding",
        "purpose": "Anchor yourself in the present moment using your five senses. Helpful for anxiety, panic, dissociation, or when thoughts feel overwhelming.",
        "duration_minutes": duration,
        "estimated_seconds_per_item": duration * 60 / 15,
        "preparation": {
            "instruction": "Sit or stand comfortably. Take one deep breath.",
            "reminder": "There are no wrong answers. Just notice what's present without judgment.",
        },
        "exercise": exercise,
        "variations": [
            "If 5-4-3-2-1 feels too long, try 3-2-1",
            "If you're very overwhelmed, just do '5 things I can see' and repeat it",
            "Combine with walking: notice 5 things you see while walking slowly",
        ],
        "summary": format!("In {} minutes, you anchored yourself with 5+4+3+2+1 = 15 present-moment observations.", duration),
    })
}

// (name, duration, instruction, intensity)
const QUICK_GROUNDING: &[(&str, &str, &str, &str)] = &[
    (
        "Cold Water Splash",
        "30 seconds",
        "Splash cold water on your face or hold ice cubes. The temperature shock activates your dive reflex and interrupts panic.",
        "high",
    ),
    (
        "Feet on Floor",
        "1 minute",
        "Press your feet firmly into the ground. Notice the pressure, the support. Stand and shift your weight from foot to foot if needed.",
        "low",
    ),
    (
        "Name Categories",
        "2-3 minutes",
        "Pick a category (animals, cities, foods) and name as many as you can. This engages your thinking brain and interrupts emotion spirals.",
        "medium",
    ),
    (
        "Hand on Heart",
        "2 minutes",
        "Place your hand on your heart. Feel it beating. Say: 'I am here. I am safe. This feeling will pass.' Repeat slowly.",
        "low",
    ),
    (
        "Butterfly Hug",
        "1-2 minutes",
        "Cross your arms and place hands on opposite shoulders. Gently tap alternating hands. This bilateral stimulation is calming.",
        "medium",
    ),
    (
        "Strong Muscle Tension",
        "2 minutes",
        "Tense all your muscles hard for 10 seconds, then release completely. Repeat 3 times. This releases physical anxiety.",
        "high",
    ),
];

/// Short grounding techniques for when 5-4-3-2-1 is too much.
pub fn quick_grounding_options() -> Value {
    QUICK_GROUNDING
        .iter()
        .map(|(name, duration, instruction, intensity)| {
            json!({
                "name": name,
                "duration": duration,
                "instruction": instruction,
                "intensity": intensity,
            })
        })
        .collect()
}

pub fn tools() -> ToolSet {
    ToolSet::new(vec![
        Arc::new(PureTool::new(
            "one_breath_instruction",
            "Immediate single-breath practice for moments of overwhelm.",
            || json!({"type": "object", "properties": {}}),
            |_| Ok(json!(ONE_BREATH)),
        )),
        Arc::new(PureTool::new(
            "body_scan",
            "Guided body scan script sized to the available minutes (3, 5 or 10).",
            || json!({"type": "object", "properties": {"duration": {"type": "integer", "default": 5}}}),
            |args| Ok(body_scan(u32_arg_or(args, "duration", 5))),
        )),
        Arc::new(PureTool::new(
            "values_checkin",
            "Reflective prompts to clarify what matters most when feeling lost or stuck.",
            || json!({"type": "object", "properties": {}}),
            |_| Ok(json!(VALUES_CHECKIN)),
        )),
        Arc::new(PureTool::new(
            "grounding_exercise",
            "5-4-3-2-1 sensory grounding for anxiety, racing thoughts, or dissociation.",
            || json!({"type": "object", "properties": {"duration": {"type": "integer", "default": 3}}}),
            |args| Ok(grounding_exercise(u32_arg_or(args, "duration", 3))),
        )),
        Arc::new(PureTool::new(
            "quick_grounding_options",
            "Menu of short grounding techniques with duration and intensity.",
            || json!({"type": "object", "properties": {}}),
            |_| Ok(quick_grounding_options()),
        )),
    ])
}
