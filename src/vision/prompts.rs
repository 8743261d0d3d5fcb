//! Rubric prompts sent alongside renders.

/// General-purpose analysis of a single render.
pub const RENDER_ANALYSIS: &str = "\
Analyze this Blender render in detail. Please describe:

1. VISIBILITY: Are there any visible characters or objects? Is the image completely white, \
black, or does it have content? Can you see the letters A, B, C?
2. COLORS: What colors are visible? Are they bright and clear or faded?
3. LIGHTING: Is the scene well-lit or too dark/bright? Are shadows visible?
4. POSITIONING: Where are objects positioned? Are the characters properly spaced?
5. STYLE: Does it look 2D or 3D? Is it cartoonish as intended?
6. TECHNICAL ISSUES: Any obvious rendering problems, missing elements or quality issues?

Please be very specific and detailed in your analysis.";

/// Rubric for judging one camera-sweep candidate.
pub const CAMERA_RUBRIC: &str = "\
Analyze this camera test render of a cartoon scene: three letter characters (A red, B pink, \
C green) in front of a waterfall, with a pagoda, trees and clouds.

Rate each criterion from 1 to 10:
1. CHARACTER VISIBILITY: Are A, B, C clearly visible, well sized, with distinguishable colors \
and visible eyes?
2. WATERFALL VISIBILITY: Is the waterfall clearly visible and prominent in the frame?
3. ENVIRONMENT VISIBILITY: Are the trees, pagoda and ground visible and well framed?
4. COMPOSITION QUALITY: Is the composition balanced and the camera angle effective?
5. TECHNICAL QUALITY: Is the image clear and well lit?

Provide an overall score (1-10), specific strengths, specific weaknesses, recommendations, and \
whether this position would work for the final render (YES/NO). Be brutally honest.";

/// Side-by-side comparison of two renders.
pub const COMPARE_RUBRIC: &str = "\
Compare these two Blender renders side by side:

1. DIFFERENCES: What is different between the two? Which one looks better? What improvements \
or regressions do you see?
2. VISIBILITY: Are the characters visible in both? Any differences in clarity?
3. COLORS: How do the colors compare? Which has better color quality?
4. LIGHTING: Which is better lit?
5. OVERALL QUALITY: Which render is closer to a clean 2D cartoon style? What specific \
improvements would you suggest?

Please be detailed and specific in your comparison.";

/// Current render (first image) against the 2D concept reference (second image).
pub const REFERENCE_RUBRIC: &str = "\
The first image is our current Blender render. The second image is the 2D concept reference it \
should match.

1. CHARACTERS: Are the letter characters the same shapes, colors and proportions? Are faces, \
eyes and limbs present and readable?
2. ENVIRONMENT: Does the waterfall, cliffside, pagoda, trees and clouds layout match?
3. COLORS AND STYLE: How close is the palette and the flat cartoon look?
4. COMPOSITION: Is the framing, camera height and character placement the same?
5. MISSING OR EXTRA ELEMENTS: List anything in one image but not the other.
6. VERDICT: What percentage of the reference does the render achieve, and what are the three \
most important fixes?

Be brutally honest and specific.";

/// Appended to a rubric when a machine-readable score is required.
pub const SCORE_INSTRUCTION: &str = "\
Respond ONLY with a JSON object of the form \
{\"overall_score\": <number from 1 to 10>, \"summary\": \"<two or three sentences>\"}.";

/// `rubric` followed by [`SCORE_INSTRUCTION`].
pub fn scored(rubric: &str) -> String {
    format!("{}\n\n{SCORE_INSTRUCTION}", rubric.trim_end())
}
