//! Prompt builders for every generation call.
//!
//! Centralising the prompts here serves two purposes: changing the voice of
//! a section means editing exactly one place, and unit tests can inspect
//! prompt text without touching the network. Each builder returns the full
//! prompt for one call; language selection happens here, not at the call
//! sites.

use crate::config::Language;

/// Truncate on a char boundary after `max_chars` characters.
fn clip(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn viral_title(lang: Language, title: &str, abstract_text: &str) -> String {
    match lang {
        Language::Zh => format!(
            "你是一位顶级科技自媒体编辑。请为这篇 AI 论文创作一个爆款标题。\n\n\
             ## 严格要求\n\
             1. **长度**：15-25个中文字（必须严格遵守）\n\
             2. **格式**：必须包含一个核心英文术语（如模型名、技术名）\n\
             3. **禁止**：不要用“震惊”、“重磅”等陈词滥调；不要用emoji；不要用问号结尾。\n\n\
             ## 推荐技巧（选用1-2个）\n\
             - 对比反差：“不用标注数据，也能超越监督学习”\n\
             - 数字冲击：“4亿图文对训练出的视觉通才”\n\
             - 核心价值：“让AI看懂任何图片的秘密武器”\n\n\
             ## 论文信息\n标题: {title}\n摘要: {}\n\n\
             直接输出一个标题（不要编号、不要解释）：",
            clip(abstract_text, 400)
        ),
        Language::En => format!(
            "You are a top tech content editor. Create a viral, attention-grabbing title for this AI paper.\n\n\
             Requirements:\n\
             - Spark curiosity\n\
             - Highlight breakthrough or disruption\n\
             - Use techniques like numbers or comparisons\n\
             - 10-20 words\n\
             - No emoji\n\n\
             Paper: {title}\nAbstract: {}\n\n\
             Output title only:",
            clip(abstract_text, 500)
        ),
    }
}

pub fn hook_intro(lang: Language, title: &str, abstract_text: &str) -> String {
    match lang {
        Language::Zh => format!(
            "你是一位擅长讲故事的科技作者。请为这篇论文写一段引人入胜的导读。\n\n\
             ## 内容要求\n\
             1. **开头**（第1段）：从一个具体场景或问题切入，让读者产生共鸣\n\
             2. **痛点**（第2段）：用生动语言描述当前技术的局限和困境\n\
             3. **解决方案**（第3段）：自然引出这篇论文的创新方案\n\n\
             ## 格式要求\n\
             - 分成 2-3 个自然段落（每段用空行分隔）\n\
             - 每段 60-80 字，总共 150-200 字\n\
             - 保留关键英文术语\n\n\
             论文标题: {title}\n摘要: {}\n\n\
             直接输出（用空行分段）：",
            clip(abstract_text, 500)
        ),
        Language::En => format!(
            "Write an engaging opening paragraph (100-150 words) for this paper.\n\n\
             Requirements:\n\
             - Start with a concrete scenario or problem\n\
             - Describe current limitations vividly\n\
             - Naturally introduce \"this paper proposes an innovative solution\"\n\
             - Make readers want to continue\n\n\
             Paper: {title}\nAbstract: {}\n\n\
             Output opening paragraph:",
            clip(abstract_text, 600)
        ),
    }
}

pub fn problem_statement(lang: Language, title: &str, abstract_text: &str) -> String {
    match lang {
        Language::Zh => format!(
            "请用通俗易懂的语言解释这篇论文要解决的核心问题（100-150字）。\n\n\
             要求：\n\
             - 说明现有方法的不足之处\n\
             - 解释为什么这个问题重要\n\
             - 用生活化的例子帮助理解\n\
             - 保留关键英文术语\n\n\
             论文标题: {title}\n摘要: {}\n\n\
             直接输出问题陈述：",
            clip(abstract_text, 600)
        ),
        Language::En => format!(
            "Explain the core problem this paper solves (80-100 words).\n\n\
             Requirements:\n\
             - Explain limitations of existing methods\n\
             - Why this problem matters\n\
             - Use relatable examples\n\n\
             Paper: {title}\nAbstract: {}\n\n\
             Output problem statement:",
            clip(abstract_text, 600)
        ),
    }
}

pub fn solution_overview(lang: Language, title: &str, abstract_text: &str) -> String {
    match lang {
        Language::Zh => format!(
            "请用通俗易懂的语言概述这篇论文的核心解决方案（150-200字）。\n\n\
             要求：\n\
             - 解释这个方法的核心思想是什么\n\
             - 用直白的语言，避免过多术语\n\
             - 如果有，用类比来帮助理解\n\
             - 保留关键英文术语（如模型名称、技术名词）\n\
             - 突出“巧妙之处”\n\n\
             论文标题: {title}\n摘要: {abstract_text}\n\n\
             直接输出解决方案概述："
        ),
        Language::En => format!(
            "Describe the core solution in simple terms (100-150 words).\n\n\
             Requirements:\n\
             - Explain the key idea\n\
             - Use analogies if helpful\n\
             - Highlight what's clever about it\n\n\
             Paper: {title}\nAbstract: {abstract_text}\n\n\
             Output solution overview:"
        ),
    }
}

/// Base prompt for the multimodal architecture walk-through. The cropped
/// main figure (when available) is attached as a separate image part, with
/// [`figure_note`] appended after it.
pub fn architecture(
    lang: Language,
    title: &str,
    abstract_text: &str,
    method_text: Option<&str>,
) -> String {
    let method_block = |max: usize| {
        method_text
            .map(|m| match lang {
                Language::Zh => format!("**Method 章节**:\n{}\n\n", clip(m, max)),
                Language::En => format!("**Method Section**:\n{}\n\n", clip(m, max)),
            })
            .unwrap_or_default()
    };

    match lang {
        Language::Zh => format!(
            "你是一位资深 AI 研究员，请讲解这篇论文的方法和网络架构。\n\n\
             ## 论文信息\n**标题**: {title}\n**摘要**: {}\n\n{}\
             ## 输出格式（严格按此结构）\n\n\
             ### 一、整体流程概述\n\n\
             用 3-4 句话概括整个方法的核心思想，写成连贯段落，不要用列表。\n\n\
             ### 二、形象化理解\n\n\
             用一个统一的比喻来帮助理解核心思想（2-3 句话）。\n\n\
             ### 三、技术细节\n\n\
             详细讲解 Pipeline 中的每个关键步骤，每个步骤用独立的小标题：\n\n\
             #### 步骤 1: [中文步骤名称]\n\n\
             **输入**: 描述输入数据的形式和维度。\n\n\
             **处理**: 说明经过哪个模块，具体做了什么操作。\n\n\
             **输出**: 说明输出结果和维度变化。\n\n\
             （根据实际 Pipeline 的复杂度，可能有 3-5 个步骤）\n\n\
             ### 四、最终输出\n\n\
             说明模型最终输出是什么，如何用于实际任务。\n\n\
             ## 写作要求\n\
             - **必须全部使用中文撰写**，只有专业术语保留英文（如 Encoder、Transformer）\n\
             - 张量维度用数学格式（如 [B, 3, 224, 224] → [B, 512]）\n\
             - 总字数 500-700 字\n\n\
             请直接用中文输出：",
            clip(abstract_text, 600),
            method_block(3500)
        ),
        Language::En => format!(
            "You are a senior AI researcher. Explain this paper's method and architecture.\n\n\
             ## Paper Info\n**Title**: {title}\n**Abstract**: {}\n\n{}\
             ## Output Format (Use Markdown headings)\n\n\
             ### 1. Pipeline Overview\n\
             3-4 sentences summarizing what the method does.\n\n\
             ### 2. Intuitive Understanding\n\
             ONE simple analogy (2-3 sentences) to build intuition.\n\n\
             ### 3. Technical Details\n\n\
             For each key step in the pipeline:\n\n\
             **Step Name**\n\
             - **Input**: Data format and dimensions\n\
             - **Process**: Which module, what operation\n\
             - **Output**: Output format and dimensions\n\n\
             Repeat for all key steps.\n\n\
             ### 4. Final Output\n\
             1-2 sentences on final output and usage.\n\n\
             ## Requirements\n\
             - Include tensor dimensions (e.g., [B, 3, 224, 224] → [B, 512])\n\
             - 400-500 words total\n\n\
             Output directly:",
            clip(abstract_text, 600),
            method_block(3500)
        ),
    }
}

/// Appended after the figure image in the multimodal architecture call.
pub fn figure_note(lang: Language) -> &'static str {
    match lang {
        Language::Zh => {
            "\n\n请仔细观察上面的网络架构图，结合 Method 章节的描述，给出准确且易懂的讲解。"
        }
        Language::En => {
            "\n\nPlease carefully examine the architecture diagram above and provide an accurate explanation."
        }
    }
}

pub fn key_innovations(lang: Language, title: &str, abstract_text: &str) -> String {
    match lang {
        Language::Zh => format!(
            "请列出这篇论文的 5 个关键创新点。\n\n\
             要求：\n\
             - 每个创新点用一个小标题（10字以内）+ 详细解释（50-80字）\n\
             - 突出“为什么这很重要”或“比以前好在哪里”\n\
             - 保留关键英文术语\n\
             - 用序号列出\n\n\
             论文标题: {title}\n摘要: {abstract_text}\n\n\
             直接输出5个创新点："
        ),
        Language::En => format!(
            "List 5 key innovations of this paper.\n\n\
             Format for each:\n\
             - Short title (5 words max) + detailed explanation (40-60 words)\n\
             - Highlight \"why it matters\" or \"how it improves\"\n\
             - Numbered list\n\n\
             Paper: {title}\nAbstract: {abstract_text}\n\n\
             Output 5 innovations:"
        ),
    }
}

pub fn applications(lang: Language, title: &str, abstract_text: &str) -> String {
    match lang {
        Language::Zh => format!(
            "请列出这项技术的 4 个实际应用场景。\n\n\
             要求：\n\
             - 每个场景用一个标题（8字以内）+ 具体描述（60-80字）\n\
             - 描述要具体，说明如何应用、带来什么好处\n\
             - 涵盖不同领域（如工业、医疗、生活、娱乐等）\n\
             - 用序号列出\n\n\
             论文标题: {title}\n摘要: {abstract_text}\n\n\
             直接输出4个应用场景："
        ),
        Language::En => format!(
            "List 4 real-world applications.\n\n\
             Format for each:\n\
             - Title (5 words max) + description (40-60 words)\n\
             - Be specific about how it's applied and benefits\n\
             - Cover different domains\n\
             - Numbered list\n\n\
             Paper: {title}\nAbstract: {abstract_text}\n\n\
             Output 4 applications:"
        ),
    }
}

/// The ten-question reading framework. The framework text is shared by both
/// languages; answers come back in the framework's language.
pub fn ten_questions(_lang: Language, title: &str, abstract_text: &str) -> String {
    format!(
        "你是一位资深的AI研究员和论文审稿人。请针对以下论文，回答“论文十问”——这是一套快速理解论文主旨的框架。\n\n\
         论文标题：{title}\n\n论文摘要：{abstract_text}\n\n\
         请逐一回答以下10个问题，每个问题回答2-4句话，要求：\n\
         - 回答要具体、准确，基于论文内容\n\
         - 专业术语保留英文（如 CLIP, Transformer, zero-shot）\n\
         - 语言简洁有力，避免废话\n\
         - 如果某个问题在摘要中没有明确信息，请基于论文类型和领域做合理推断\n\n\
         **Q1. 论文试图解决什么问题？**\n\
         **Q2. 这是否是一个新的问题？**\n\
         **Q3. 这篇文章要验证的科学假设是什么？**\n\
         **Q4. 相关研究有哪些？如何归类？谁是该领域值得关注的研究者？**\n\
         **Q5. 论文的解决方案关键是什么？**\n\
         **Q6. 论文的实验是如何设计的？**\n\
         **Q7. 用于评估的数据集是什么？代码是否开源？**\n\
         **Q8. 实验结果是否支持科学假设？**\n\
         **Q9. 这篇论文的主要贡献是什么？**\n\
         **Q10. 下一步可以做什么？**\n\n\
         请按以下格式输出（保持Q1-Q10的结构）："
    )
}

pub fn reviewer_perspective(lang: Language, title: &str, abstract_text: &str) -> String {
    match lang {
        Language::Zh => format!(
            "你是一位顶级 AI 会议（如 NeurIPS、CVPR、ICML）的资深审稿人。请以审稿人的批判性视角审视这篇论文。\n\n\
             论文标题：{title}\n论文摘要：{abstract_text}\n\n\
             请用**中文**从以下三个角度给出简洁有力的评价（每个角度 2-3 句话）：\n\n\
             **🔴 潜在的 Weakness**\n- 指出 1-2 个方法或实验设计上的潜在问题\n\n\
             **🟡 尖锐问题**\n- 列出 1-2 个审稿人可能提出的尖锐问题\n\n\
             **🟢 作者可能的回应**\n- 说明作者可能如何合理回应或辩护\n\n\
             要求：**必须全部使用中文撰写**，只有专业术语保留英文；总字数控制在 200 字以内。\n\n\
             请用中文直接输出："
        ),
        Language::En => format!(
            "You are a senior reviewer for top AI conferences (NeurIPS, CVPR, ICML). Critically review this paper.\n\n\
             Title: {title}\nAbstract: {abstract_text}\n\n\
             Provide brief comments from three perspectives (2-3 sentences each):\n\n\
             **🔴 Potential Weaknesses**\n- Point out 1-2 potential issues in method or experimental design\n\n\
             **🟡 Sharp Questions**\n- List 1-2 challenging questions a reviewer might ask\n\n\
             **🟢 Possible Author Response**\n- How might authors reasonably respond to these concerns\n\n\
             Keep it concise, under 200 words total. Output directly:"
        ),
    }
}

pub fn improvement_directions(lang: Language, title: &str, abstract_text: &str) -> String {
    match lang {
        Language::Zh => format!(
            "你是一位 AI 研究者，正在阅读这篇论文并思考未来的研究方向。\n\n\
             论文标题：{title}\n论文摘要：{abstract_text}\n\n\
             请用**中文**提出 2-3 个潜在的改进方向或未来研究思路，每个方向用 1-2 句话描述。\n\n\
             要求：思路要有启发性；可以涉及方法改进、新应用场景、与其他技术结合、解决现有局限；\
             只有专业术语保留英文；总字数控制在 100-150 字。\n\n\
             请用中文直接输出（用数字编号）："
        ),
        Language::En => format!(
            "You are an AI researcher thinking about future research directions after reading this paper.\n\n\
             Title: {title}\nAbstract: {abstract_text}\n\n\
             Propose 2-3 potential improvement directions or future research ideas. Each direction in 1-2 sentences.\n\n\
             Requirements:\n\
             - Ideas should be thought-provoking\n\
             - Can involve: method improvements, new applications, combining with other techniques\n\
             - Keep it concise, 100-150 words total\n\n\
             Output directly (numbered):"
        ),
    }
}

// ── Illustration scene design ─────────────────────────────────────────────
//
// Two-stage image prompting: a text-model call first compresses the
// narrative into one concrete visual scene, then the scene drives the image
// model. Scene design prompts are shared (zh); the art direction below is
// always English.

pub fn intro_scene(hook_text: &str) -> String {
    format!(
        "你是一位资深插画师，需要为下面这段导读文字设计一幅插图。\n\n\
         导读内容：\n\"{}\"\n\n\
         请分析这段文字的核心含义，然后设计一个能够直观表达这个含义的具体场景。\n\n\
         要求：\n\
         1. 场景必须能让人一眼就理解导读在说什么\n\
         2. 用具体的人物/物体/动作来表达抽象概念\n\
         3. 场景要有故事感\n\
         4. 输出格式：一句话描述场景（50字以内），具体到人物在做什么、环境是什么样的\n\n\
         直接输出你设计的场景描述：",
        clip(hook_text, 400)
    )
}

pub fn problem_scene(problem_text: &str) -> String {
    format!(
        "你是一位资深插画师，需要为下面这段“问题背景”文字设计一幅插图。\n\n\
         问题背景：\n\"{}\"\n\n\
         请设计一个能够直观表达这个问题的具体场景（50字以内）。\n\n\
         要求：\n\
         1. 场景必须能让人一眼就理解“问题出在哪里”\n\
         2. 用具体的人物/物体/动作来表达技术困难\n\
         3. 要有戏剧张力\n\n\
         直接输出场景描述：",
        clip(problem_text, 400)
    )
}

/// Fallback scenes when the scene-design call itself fails.
pub const DEFAULT_INTRO_SCENE: &str =
    "A person connecting images and words with glowing threads of light";
pub const DEFAULT_PROBLEM_SCENE: &str =
    "A robot confused by an unfamiliar object it cannot classify";

pub fn hero_illustration(title: &str) -> String {
    format!(
        "A stunning wide cinematic banner image for an AI research breakthrough.\n\n\
         Theme: \"{}\"\n\n\
         Visual style:\n\
         - Dreamlike, ethereal atmosphere with soft glowing particles\n\
         - Deep space blue and violet gradient background\n\
         - Abstract flowing data streams and neural pathways made of light\n\
         - Crystalline geometric structures floating in space\n\
         - Soft bokeh effects and lens flares\n\
         - Photorealistic 3D render quality\n\
         - No text, no letters, no words, no labels",
        clip(title, 60)
    )
}

pub fn intro_illustration(scene: &str) -> String {
    format!(
        "Create a vivid illustration of this exact scene:\n\n{scene}\n\n\
         Art direction:\n\
         - Modern, clean digital illustration style\n\
         - Warm, inviting color palette with good contrast\n\
         - Clear visual storytelling - the action should be immediately obvious\n\
         - Expressive characters with clear emotions\n\
         - Professional quality, suitable for a tech article\n\
         - CRITICAL: Absolutely NO text, NO letters, NO words, NO labels in the image"
    )
}

pub fn problem_illustration(scene: &str) -> String {
    format!(
        "Create a vivid illustration of this scene showing a problem:\n\n{scene}\n\n\
         Art direction:\n\
         - Modern digital illustration style\n\
         - Colors that convey difficulty: muted blues, grays, accent of orange\n\
         - Clear visual storytelling - the problem should be immediately obvious\n\
         - Show confusion, frustration, or being overwhelmed\n\
         - Professional quality for a tech article\n\
         - CRITICAL: NO text, NO letters, NO words in the image"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip("hello", 10), "hello");
        assert_eq!(clip("hello", 3), "hel");
        // Multi-byte: must not split inside a code point.
        assert_eq!(clip("深度学习", 2), "深度");
    }

    #[test]
    fn prompts_embed_paper_info() {
        for lang in [Language::Zh, Language::En] {
            let p = viral_title(lang, "ResNet", "residual learning abstract");
            assert!(p.contains("ResNet"));
            assert!(p.contains("residual learning"));
        }
    }

    #[test]
    fn architecture_prompt_includes_method_when_present() {
        let with = architecture(Language::En, "T", "A", Some("method body"));
        assert!(with.contains("method body"));
        let without = architecture(Language::En, "T", "A", None);
        assert!(!without.contains("Method Section"));
    }

    #[test]
    fn illustration_prompts_forbid_text() {
        assert!(hero_illustration("T").contains("No text"));
        assert!(intro_illustration("scene").contains("NO text"));
        assert!(problem_illustration("scene").contains("NO text"));
    }
}
